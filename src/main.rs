use anyhow::Result;
use srcpress::cli::{init_logger, parse_args};
use srcpress::{generate_config, load_config, run_press};

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    init_logger(args.verbosity);

    if args.generate {
        generate_config(&args.config_path)?;
        println!(
            "Generated default config file - {}",
            args.config_path.display()
        );
        return Ok(());
    }

    let config = load_config(&args.config_path)?;
    let report = run_press(&config).await?;
    if !args.silent {
        print!("{}", report.summary());
    }
    Ok(())
}
