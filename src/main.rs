use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use structopt::StructOpt;
use tetravm::frontend::{self, ExecOpts, Outcome};
use tetravm::sim::mem::DEFAULT_MEM_SIZE;

#[derive(StructOpt, Debug)]
#[structopt(name = "tetravm")]
enum CommandRoot {
    /// Assembles a source file into a binary image.
    Asm(SubcommandAsm),
    /// Runs a binary image and dumps a range of memory to CSV.
    Run(SubcommandRun),
}

#[derive(StructOpt, Debug)]
struct SubcommandAsm {
    #[structopt(name = "in.asm", parse(from_os_str))]
    in_src: PathBuf,

    #[structopt(name = "out.bin", parse(from_os_str))]
    out_bin: PathBuf,

    /// Prints a listing of every assembled word.
    #[structopt(long)]
    test: bool,
}

#[derive(StructOpt, Debug)]
struct SubcommandRun {
    #[structopt(name = "prog.bin", parse(from_os_str))]
    in_bin: PathBuf,

    #[structopt(name = "dump.csv", parse(from_os_str))]
    out_csv: PathBuf,

    /// Inclusive range of addresses to dump, as start-end.
    #[structopt(name = "range")]
    range: String,

    /// Fails if execution stops on an unknown opcode.
    #[structopt(long)]
    strict: bool,

    /// Number of memory cells.
    #[structopt(long, default_value = "1024")]
    mem_size: usize,
}

fn root(cmd: CommandRoot) -> anyhow::Result<Outcome> {
    match cmd {
        CommandRoot::Asm(args) => {
            frontend::assemble(&args.in_src, &args.out_bin, args.test)
                .context("assembly aborted")
        },
        CommandRoot::Run(args) => {
            let opts = ExecOpts { strict: args.strict, mem_size: args.mem_size };
            if opts.mem_size != DEFAULT_MEM_SIZE {
                log::info!("using memory of {} cells", opts.mem_size);
            }
            frontend::execute(&args.in_bin, &args.out_csv, &args.range, opts)
                .context("execution aborted")
        },
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn")
    ).init();

    let outcome = root(CommandRoot::from_args())?;
    Ok(ExitCode::from(outcome.exit_code()))
}
