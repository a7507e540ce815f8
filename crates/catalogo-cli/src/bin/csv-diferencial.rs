use std::process::ExitCode;

fn main() -> ExitCode {
    catalogo_cli::cmd::diff::main()
}
