use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = daemonctl::bin::Args::parse();
    daemonctl::bin::run(args)
}
