//! `simple-orm` command line tool.
//!
//! ```text
//! simple-orm make-migration [--dry-run] [--verbose] [--sql] [--name N]
//!                           [--models DIR] [--migrations DIR] [--package DIR]
//! simple-orm show-create-model [--ls] [--models DIR] [--package DIR] [MODEL...]
//! ```

mod options;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use simple_orm::{Formatter, MigrationMaker, MysqlDialect, load_models, migration::sql::migration_sql};

use crate::options::{Layer, ProjectOptions};

#[derive(Parser, Debug)]
#[command(name = "simple-orm", version)]
#[command(about = "Migrations and model inspection for simple-orm projects", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Diffs the models against the latest migration and writes the next one
    MakeMigration(MakeMigrationArgs),
    /// Prints the CREATE TABLE statement of each model
    ShowCreateModel(ShowCreateModelArgs),
}

#[derive(Args, Debug)]
struct MakeMigrationArgs {
    /// Compute the migration without writing it
    #[arg(long)]
    dry_run: bool,

    /// Log the migration as YAML
    #[arg(long)]
    verbose: bool,

    /// Print the SQL the migration translates to
    #[arg(long)]
    sql: bool,

    /// Name suffix of the migration file
    #[arg(short, long)]
    name: Option<String>,

    /// Models directory
    #[arg(long)]
    models: Option<PathBuf>,

    /// Migrations directory
    #[arg(long)]
    migrations: Option<PathBuf>,

    /// Directory the Cargo.toml lookup starts from
    #[arg(long)]
    package: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ShowCreateModelArgs {
    /// List the model names only
    #[arg(short, long)]
    ls: bool,

    /// Models directory
    #[arg(short, long)]
    models: Option<PathBuf>,

    /// Directory the Cargo.toml lookup starts from
    #[arg(short, long)]
    package: Option<PathBuf>,

    /// Models to show, all when empty
    #[arg(value_name = "MODEL")]
    names: Vec<String>,
}

fn make_migration(args: MakeMigrationArgs) -> Result<()> {
    let options = ProjectOptions::compute(
        args.package.as_deref(),
        Layer {
            models: args.models,
            migrations: args.migrations,
        },
    )?;
    info!(
        "models: {}, migrations: {}",
        options.models.display(),
        options.migrations.display()
    );

    let mut maker = MigrationMaker::new(&options.models, &options.migrations)
        .dry_run(args.dry_run)
        .verbose(args.verbose);
    if let Some(name) = args.name {
        maker = maker.name(name);
    }

    match maker.make_migration().context("cannot make migration")? {
        Some(migration) => {
            println!("{}", migration.file_name());
            if args.sql {
                let formatter = Formatter::new(&MysqlDialect);
                for statement in migration_sql(&formatter, &migration) {
                    println!("\n{}", statement);
                }
            }
        }
        None => println!("No changes detected"),
    }
    Ok(())
}

fn show_create_model(args: ShowCreateModelArgs) -> Result<()> {
    let options = ProjectOptions::compute(
        args.package.as_deref(),
        Layer {
            models: args.models,
            migrations: None,
        },
    )?;

    let models: Vec<_> = load_models(&options.models)
        .with_context(|| format!("cannot load models from {}", options.models.display()))?
        .into_iter()
        .filter(|model| args.names.is_empty() || args.names.contains(&model.name))
        .collect();

    if args.ls {
        println!("Connector: mysql");
        println!("Models:");
        for model in &models {
            println!("  - {}", model.name);
        }
        return Ok(());
    }

    let formatter = Formatter::new(&MysqlDialect);
    let statements: Vec<String> = models.iter().map(|model| formatter.create_table(model)).collect();
    println!("{}", statements.join("\n\n"));
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match Cli::parse().command {
        Command::MakeMigration(args) => make_migration(args),
        Command::ShowCreateModel(args) => show_create_model(args),
    }
}
