fn main() -> anyhow::Result<()> {
    quickmenus::cli::run()
}
