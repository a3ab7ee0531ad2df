//! l1data Credential Generator
//!
//! Prints a users file line for a new account.

use clap::{Parser, ValueEnum};
use l1data::access::{Credential, Role};

/// l1data createuser
#[derive(Parser, Debug)]
#[command(name = "l1data-createuser")]
#[command(about = "Generate a salted credential line for the users file")]
#[command(version)]
struct Args {
    /// User name
    user: String,

    /// Password
    password: String,

    /// Role granted at login
    #[arg(short, long, value_enum, default_value = "normal-user")]
    role: RoleArg,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum RoleArg {
    Admin,
    NormalUser,
    ReadOnly,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Admin => Role::Admin,
            RoleArg::NormalUser => Role::NormalUser,
            RoleArg::ReadOnly => Role::ReadOnly,
        }
    }
}

fn main() {
    let args = Args::parse();

    if args.user.contains(',') || args.user.contains(char::is_whitespace) {
        eprintln!("Error: user name must not contain commas or whitespace");
        std::process::exit(1);
    }

    let credential = Credential::new(&args.user, args.role.into(), &args.password);
    eprintln!("insert this into the users file:");
    println!("{}", credential);
}
