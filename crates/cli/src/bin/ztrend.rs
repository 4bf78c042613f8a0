use anyhow::Result;

fn main() -> Result<()> {
    ztrend_cli::main_entry()
}
