mod cli;

use userstore::{config, logging};
use userstore_db::pool::ConnectionPool;
use userstore_db::schema;
use userstore_db::store::RecordStore;
use userstore_db::update::UpdateFieldSet;
use userstore_common::RecordId;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config_path = cli.config.as_deref();
    let init_schema = cli.init_schema;

    match cli.command {
        Commands::Probe => probe(config_path),
        Commands::Create { name, email, age } => {
            let store = open_store(config_path, init_schema)?;
            let id = store.create(&name, &email, age)?;
            println!("{}", id);
            Ok(())
        }
        Commands::Get { id } => {
            let store = open_store(config_path, init_schema)?;
            match store.read(RecordId::from(id))? {
                Some(record) => {
                    println!("{}", record);
                    Ok(())
                }
                None => anyhow::bail!("Record {} not found", id),
            }
        }
        Commands::List { json } => {
            let store = open_store(config_path, init_schema)?;
            list(&store, json)
        }
        Commands::Update {
            id,
            name,
            email,
            age,
        } => {
            let store = open_store(config_path, init_schema)?;
            let fields = UpdateFieldSet::from_options(name, email, age);
            if fields.is_empty() {
                anyhow::bail!("Nothing to update: pass --name, --email or --age");
            }
            if !store.update(RecordId::from(id), &fields)? {
                anyhow::bail!("Record {} not found", id);
            }
            if let Some(record) = store.read(RecordId::from(id))? {
                println!("{}", record);
            }
            Ok(())
        }
        Commands::Delete { id } => {
            let store = open_store(config_path, init_schema)?;
            if !store.delete(RecordId::from(id))? {
                anyhow::bail!("Record {} not found", id);
            }
            println!("Deleted record {}", id);
            Ok(())
        }
        Commands::Demo => demo(config_path),
        Commands::Validate {
            config: validate_path,
        } => validate_config(validate_path.as_deref().or(config_path)),
        Commands::Version => {
            println!("userstore {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_store(config_path: Option<&Path>, init_schema: bool) -> Result<RecordStore> {
    let config = config::load_config_or_default(config_path)?;
    let pool_config = config.pool_configuration()?;

    tracing::info!(location = %pool_config.location(), "Opening database");
    let pool = ConnectionPool::open(pool_config).context("Failed to open connection pool")?;

    if init_schema {
        let handle = pool.acquire()?;
        schema::ensure_schema(handle.connection()?)?;
    }

    Ok(RecordStore::new(Arc::new(pool)))
}

fn probe(config_path: Option<&Path>) -> Result<()> {
    let store = open_store(config_path, false)?;
    if !store.probe() {
        anyhow::bail!("Database is not reachable");
    }
    println!("✓ Database is reachable");

    let handle = store.pool().acquire()?;
    if schema::users_table_exists(handle.connection()?)? {
        println!("  users table: present");
    } else {
        println!("  users table: missing (run with --init-schema)");
    }
    Ok(())
}

fn list(store: &RecordStore, json: bool) -> Result<()> {
    let records = store.read_all()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No records");
    } else {
        for record in &records {
            println!("{}", record);
        }
    }

    Ok(())
}

fn demo(config_path: Option<&Path>) -> Result<()> {
    let store = open_store(config_path, true)?;
    if !store.probe() {
        anyhow::bail!("Database is not reachable");
    }

    println!("\n1. Creating users...");
    let juan = store.create("Juan Pérez", "juan@email.com", Some(30))?;
    let maria = store.create("María García", "maria@email.com", Some(25))?;
    let carlos = store.create("Carlos López", "carlos@email.com", Some(35))?;
    println!("  Created {}, {}, {}", juan, maria, carlos);

    println!("\n2. Reading one user...");
    if let Some(record) = store.read(juan)? {
        println!("  Found: {}", record);
    }

    println!("\n3. Reading all users...");
    for record in store.read_all()? {
        println!("  - {}", record);
    }

    println!("\n4. Updating user...");
    let fields = UpdateFieldSet::new().name("María Fernández").age(26);
    if store.update(maria, &fields)? {
        if let Some(record) = store.read(maria)? {
            println!("  Updated: {}", record);
        }
    }

    println!("\n5. Deleting user...");
    if store.delete(carlos)? {
        println!("  Deleted record {}", carlos);
    }

    println!("\n6. Remaining users:");
    for record in store.read_all()? {
        println!("  - {}", record);
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            print_config(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            config.pool_configuration()?;
            print_config(&config);
        }
    }

    Ok(())
}

fn print_config(config: &config::Config) {
    println!("✓ Configuration is valid");
    println!("  Database: {}", config.database.url);
    println!(
        "  Pool: {} warm + {} overflow",
        config.pool.max_pool_size, config.pool.max_overflow
    );
    println!(
        "  Acquisition timeout: {}s",
        config.pool.acquisition_timeout_secs
    );
    println!("  Recycle age: {}s", config.pool.recycle_age_secs);
}
