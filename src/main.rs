use clap::{Parser, ValueEnum};
use luaconf::Context;

/// Query a typed value from a Lua configuration file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Lua configuration file
    file: std::path::PathBuf,

    /// Dotted path (default), or individual keys with --keys
    #[arg(required = true)]
    query: Vec<String>,

    /// Treat each QUERY argument as one verbatim key instead of parsing a
    /// dotted path (reaches keys containing "." or quotes)
    #[arg(long)]
    keys: bool,

    /// Expected value type
    #[arg(long = "as", value_enum, default_value = "string")]
    ty: ValueType,

    /// Abort script execution after this many VM instructions (0 = no limit)
    #[arg(long, default_value_t = 0)]
    limit: u32,

    /// Print the value as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ValueType {
    Bool,
    Int,
    Float,
    String,
}

fn main() {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut conf = Context::new();
    if args.limit > 0 {
        // Cannot fail on a fresh context.
        conf.set_instruction_limit(args.limit).unwrap();
    }

    if let Err(err) = conf.load_file(&args.file) {
        eprintln!("{}: {}", err.code().label(), err);
        std::process::exit(1);
    }

    if !args.keys && args.query.len() != 1 {
        eprintln!("expected exactly one dotted path (use --keys for a key list)");
        std::process::exit(2);
    }
    let path = args.query[0].as_str();
    let keys: Vec<&str> = args.query.iter().map(String::as_str).collect();

    let fetched = match args.ty {
        ValueType::Bool => {
            let r = if args.keys { conf.get_boolean_by_keys(&keys) } else { conf.get_boolean(path) };
            r.map(|v| serde_json::Value::from(v))
        }
        ValueType::Int => {
            let r = if args.keys { conf.get_integer_by_keys(&keys) } else { conf.get_integer(path) };
            r.map(|v| serde_json::Value::from(v))
        }
        ValueType::Float => {
            let r = if args.keys { conf.get_double_by_keys(&keys) } else { conf.get_double(path) };
            r.map(|v| serde_json::Value::from(v))
        }
        ValueType::String => {
            let r = if args.keys { conf.get_string_by_keys(&keys) } else { conf.get_string(path) };
            r.map(|bytes| serde_json::Value::from(String::from_utf8_lossy(&bytes).into_owned()))
        }
    };

    match fetched {
        Ok(value) => {
            if args.json {
                println!("{value}");
            } else if let serde_json::Value::String(s) = value {
                println!("{s}");
            } else {
                println!("{value}");
            }
        }
        Err(err) => {
            eprintln!("{}: {}", err.code().label(), err);
            std::process::exit(1);
        }
    }
}
