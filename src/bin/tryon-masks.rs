//! `tryon-masks` command-line entry point.

fn main() -> anyhow::Result<()> {
    tryon_masks::cli::main()
}
