//! l1data CLI Client
//!
//! Sends one command to a running server and prints the reply.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;

use clap::{Parser, Subcommand, ValueEnum};
use l1data::protocol::{read_response, write_line, Command};
use l1data::storage::Format;

/// l1data CLI
#[derive(Parser, Debug)]
#[command(name = "l1data-cli")]
#[command(about = "CLI for the l1data key-value store")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:2000")]
    server: String,

    /// Log in as this user first
    #[arg(short, long, requires = "password")]
    user: Option<String>,

    /// Password for --user
    #[arg(short, long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FileFormat {
    Native,
    Json,
    Csv,
    CsvTable,
}

impl From<FileFormat> for Format {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Native => Format::Native,
            FileFormat::Json => Format::Json,
            FileFormat::Csv => Format::Csv,
            FileFormat::CsvTable => Format::CsvTable,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a value, overwriting an existing key
    Store { key: String, value: String },

    /// Store a value without checking for an existing key
    StoreNew { key: String, value: String },

    /// Get the value stored under a key
    Get {
        key: String,

        /// Treat the key as a regular expression
        #[arg(short, long)]
        regex: bool,
    },

    /// Get the key of a stored value
    Find {
        value: String,

        /// Treat the value as a regular expression
        #[arg(short, long)]
        regex: bool,
    },

    /// Remove a key and print its value
    Remove { key: String },

    /// Link one key to another
    Link { key: String, target: String },

    /// Remove a link
    Unlink { key: String, target: String },

    /// Number of links of a key
    Links { key: String },

    /// Key of the n-th link of a key
    LinkName { key: String, index: usize },

    /// Save the store below the server's database root
    Save {
        path: String,
        #[arg(short, long, value_enum, default_value = "native")]
        format: FileFormat,
    },

    /// Load a file below the server's database root
    Load {
        path: String,
        #[arg(short, long, value_enum, default_value = "native")]
        format: FileFormat,
    },

    /// Print slot usage
    Usage,

    /// Erase every record (admin)
    EraseAll,

    /// Stop the server (admin)
    Exit,

    /// Send a line as is
    Raw { line: String },
}

impl Commands {
    fn to_line(&self) -> String {
        let command = match self {
            Commands::Store { key, value } => Command::Store {
                key: key.clone(),
                value: value.clone(),
            },
            Commands::StoreNew { key, value } => Command::StoreNew {
                key: key.clone(),
                value: value.clone(),
            },
            Commands::Get { key, regex: false } => Command::GetKey { key: key.clone() },
            Commands::Get { key, regex: true } => Command::GetRegexKey {
                pattern: key.clone(),
            },
            Commands::Find { value, regex: false } => Command::GetValue {
                value: value.clone(),
            },
            Commands::Find { value, regex: true } => Command::GetRegexValue {
                pattern: value.clone(),
            },
            Commands::Remove { key } => Command::Remove { key: key.clone() },
            Commands::Link { key, target } => Command::SetLink {
                key: key.clone(),
                target: target.clone(),
            },
            Commands::Unlink { key, target } => Command::RemoveLink {
                key: key.clone(),
                target: target.clone(),
            },
            Commands::Links { key } => Command::LinkCount { key: key.clone() },
            Commands::LinkName { key, index } => Command::LinkName {
                key: key.clone(),
                index: *index,
            },
            Commands::Save { path, format } => Command::Save {
                format: (*format).into(),
                path: path.clone(),
            },
            Commands::Load { path, format } => Command::Load {
                format: (*format).into(),
                path: path.clone(),
            },
            Commands::Usage => Command::Usage,
            Commands::EraseAll => Command::EraseAll,
            Commands::Exit => Command::Exit,
            Commands::Raw { line } => return line.clone(),
        };
        command.to_string()
    }
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> l1data::Result<()> {
    let stream = TcpStream::connect(&args.server)?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);

    if let (Some(user), Some(password)) = (&args.user, &args.password) {
        let login = Command::Login {
            user: user.clone(),
            password: password.clone(),
        };
        write_line(&mut writer, &login.to_string())?;
        let reply = read_response(&mut reader)?;
        if reply != "OK" {
            eprintln!("Login failed: {}", reply);
            std::process::exit(1);
        }
    }

    write_line(&mut writer, &args.command.to_line())?;
    println!("{}", read_response(&mut reader)?);

    // Polite close; the reply does not matter
    let _ = write_line(&mut writer, &Command::Close.to_string());
    Ok(())
}
