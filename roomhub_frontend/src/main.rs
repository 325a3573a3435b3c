fn main() -> anyhow::Result<()> {
    roomhub_frontend::run_frontend()
}
