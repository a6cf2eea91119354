fn main() -> anyhow::Result<()> {
    ctrlrouter::cli::run_cli()
}
