use ontobind::cli;

fn main() -> ontobind::Result<()> {
    cli::main()
}
