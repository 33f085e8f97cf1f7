mod cmd;
mod logging;
mod opt;
mod repl;

use simple_script::Interpreter;

fn main() {
    let opts = opt::options_from_env();
    let log = logging::init(opts.verbose);

    let mut interpreter = Interpreter::new();
    if !opt::apply_options(&opts, &mut interpreter) {
        return;
    }
    repl::read_eval_print_loop(interpreter, log);
}
