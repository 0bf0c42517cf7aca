mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use harvid::pipeline::{Outcome, Pipeline};
use harvid::validate::Verdict;
use harvid::{capture, config, tools};
use std::io::Write;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on the
    // verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "harvid=debug".to_string()
        } else {
            "harvid=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Download { har, output, yes } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(download(&har, output.as_deref(), cli.config.as_deref(), yes))
        }
        Commands::Scan { har } => scan(&har),
        Commands::CheckTools => check_tools(),
    }
}

async fn download(
    har: &Path,
    output: Option<&str>,
    config_path: Option<&Path>,
    assume_yes: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let mut pipeline = Pipeline::new(config);
    if !assume_yes {
        pipeline = pipeline.with_confirm(Box::new(prompt_overwrite));
    }

    match pipeline.run(har, output).await? {
        Outcome::Completed { output, verdict } => {
            match verdict {
                Verdict::Valid => println!("Output: {}", output.display()),
                Verdict::Suspect => println!(
                    "Output {} looks suspiciously small; fragments kept for inspection",
                    output.display()
                ),
            }
            Ok(())
        }
        Outcome::Declined => {
            println!("Aborted.");
            Ok(())
        }
    }
}

fn prompt_overwrite(path: &Path) -> bool {
    print!("{} already exists. Overwrite? [y/N] ", path.display());
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn scan(har: &Path) -> Result<()> {
    if !har.exists() {
        anyhow::bail!("Capture file does not exist: {:?}", har);
    }

    let text = std::fs::read_to_string(har)?;
    let locators = capture::scan(&text)?;

    for locator in &locators {
        println!("{locator}");
    }
    eprintln!("{} fragment locators", locators.len());

    Ok(())
}

fn check_tools() -> Result<()> {
    println!("Checking external tools...\n");

    let tools = tools::check_tools();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable reassembly.");
    }

    Ok(())
}
