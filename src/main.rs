use anyhow::Context;

fn main() -> anyhow::Result<()> {
    quickpeek::run().context("quickpeek exited with an error")
}
