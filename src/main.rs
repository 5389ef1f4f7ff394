use std::process::ExitCode;

fn main() -> ExitCode {
    day_shard_lib::run()
}
