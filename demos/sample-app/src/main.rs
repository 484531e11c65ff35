use chrono::NaiveDate;
use subcmd::tracing::{info, warn};
use subcmd::{init_subscriber, App, AppBuilder, AppConfig, CliError, Nested, OptionSpec};

// ============================================
// Commands
// ============================================

fn declare() -> App {
    let mut builder = AppBuilder::new(
        "Sample app",
        AppConfig::default().version("0.0.1").help(true),
    );

    builder.global(|g| {
        g.option("verbose", "Prints what is going on", OptionSpec::new().short('v'));
    });

    builder.command("show", "Shows the requested item", |c| {
        c.option("ignore_cache", "Ignores cached contents", OptionSpec::new().short('r'));
        c.option("pager", "Shows item contents in a pager", OptionSpec::new().short('p'));
        c.option("summary", "Shows only a summary of the contents", OptionSpec::new().short('s'));
        c.check("Which item should be shown?", |inv| !inv.args().is_empty());
        c.run(handlers::show);
    });

    builder.command("list", "Lists all items", |c| {
        c.option("sorted", "Sorts the listed items by name", OptionSpec::new().short('s'));
        c.check("This command expects no arguments", |inv| inv.args().is_empty());
        c.run(handlers::list);
    });

    builder.command("refresh", "Refreshes every item, then lists them", |c| {
        c.run(handlers::refresh);
    });

    builder.command("complex", "Prints the options it received", |c| {
        c.option(
            "dest",
            "The destination folder",
            OptionSpec::new().kind_of::<String>().default_with(|| {
                std::env::var("HOME").unwrap_or_else(|_| "/home/sample".to_string())
            }),
        );
        c.option("num_lines", "The number of lines to process", OptionSpec::new().default(0).short('n'));
        c.option("ratio", "Sampling ratio", OptionSpec::new().kind_named("double"));
        c.option("since", "The date where processing should start", OptionSpec::new().kind_of::<NaiveDate>());
        c.option("quiet", "Do not print out any output", OptionSpec::new().short('q'));
        c.run(handlers::complex);
    });

    builder.build()
}

// ============================================
// Handlers
// ============================================

mod handlers {
    use subcmd::{CliResult, Invocation};

    use super::*;

    const ITEMS: &[&str] = &["pear", "apple", "fig"];

    pub fn show(inv: &mut Invocation<'_>) -> CliResult<()> {
        if inv.args().iter().any(|item| item == "help") {
            return Err(inv.help());
        }
        info!(items = ?inv.args(), pager = inv.flag("pager"), "Showing items");
        if let Some(unknown) = inv.args().iter().find(|item| !ITEMS.contains(&item.as_str())) {
            return Err(CliError::invalid_argument(unknown.as_str(), "No such item"));
        }
        for item in inv.args() {
            if inv.flag("summary") {
                println!("{}: (summary)", item);
            } else {
                println!("{}", item);
            }
        }
        Ok(())
    }

    pub fn list(inv: &mut Invocation<'_>) -> CliResult<()> {
        let mut items = ITEMS.to_vec();
        if inv.flag("sorted") {
            items.sort_unstable();
        }
        if inv.flag("verbose") {
            println!("{} items", items.len());
        }
        for item in items {
            println!("{}", item);
        }
        Ok(())
    }

    pub fn refresh(inv: &mut Invocation<'_>) -> CliResult<()> {
        if !inv.args().is_empty() {
            warn!(args = ?inv.args(), "refresh ignores its arguments");
        }
        println!("Refreshing...");
        inv.run_command("list", Nested::new().args(Vec::<String>::new()))
    }

    pub fn complex(inv: &mut Invocation<'_>) -> CliResult<()> {
        if inv.flag("quiet") {
            return Ok(());
        }
        let json = serde_json::to_string_pretty(inv.opts())
            .map_err(|e| CliError::system(format!("Failed to render options: {}", e)))?;
        println!("{}", json);
        Ok(())
    }
}

// ============================================
// Main Entry Point
// ============================================

fn main() {
    // Controlled by RUST_LOG, e.g. RUST_LOG=subcmd=debug
    if let Err(e) = init_subscriber() {
        eprintln!("tracing already initialized: {}", e);
    }

    declare().run_and_exit(std::env::args().skip(1));
}
