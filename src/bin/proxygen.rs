fn main() -> anyhow::Result<()> {
    proxygen::cli::run_cli()
}
