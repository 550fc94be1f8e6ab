use clap::Parser;

/// chatd: a multi-user TCP chat server.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TCP port to listen on.
    port: u16,
}

fn main() {
    let args = Args::parse();

    if let Err(err) = chatd::run(args.port) {
        eprintln!("chatd: {err:?}");
        std::process::exit(1);
    }
}
