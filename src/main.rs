/*!
 * Signal Probe - Main Entry Point
 *
 * Single-threaded helper process driven over stdin/stdout, used to observe
 * signal effects that only show up from outside a process:
 * - default-action termination
 * - deferred delivery while a signal is blocked
 * - handler counts for repeated self-sends
 *
 * Protocol: the probe prints `ready` once its dispositions and mask are in
 * place, then follows its mode.
 */

use ai_os_signals::{
    block, dispatch, init_tracing, trap, unblock, Disposition, Signal, SignalRegistry,
};
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// How long `wait` mode stays alive waiting to be signalled
const WAIT_LIMIT: Duration = Duration::from_secs(30);
const WAIT_TICK: Duration = Duration::from_millis(20);

/// Exit code when `wait` mode was never terminated
const EXIT_NOT_SIGNALLED: i32 = 3;

fn usage() -> ! {
    eprintln!(
        "usage: sigprobe wait <SIG> [default|handler]\n       \
         sigprobe block <SIG> [default|handler]\n       \
         sigprobe repeat <SIG> <COUNT>"
    );
    std::process::exit(2);
}

fn say(line: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()
}

/// Handler disposition that counts invocations
fn counting_handler() -> (Disposition, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let disposition = Disposition::handler(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    (disposition, count)
}

/// Bind `mode` to the signal; handlers are installed first so a later
/// Default really restores the OS action
fn bind(signal: &str, mode: &str) -> Result<Arc<AtomicUsize>, Box<dyn Error>> {
    let (handler, count) = counting_handler();
    trap(signal, handler)?;
    match mode {
        "default" => trap(signal, Disposition::Default)?,
        "handler" => {}
        _ => usage(),
    }
    Ok(count)
}

/// Stay alive draining until killed
fn wait(signal: &str, mode: &str) -> Result<(), Box<dyn Error>> {
    let count = bind(signal, mode)?;
    say("ready")?;

    let mut waited = Duration::ZERO;
    while waited < WAIT_LIMIT {
        if dispatch() > 0 {
            say(&format!("handled {}", count.load(Ordering::SeqCst)))?;
        }
        std::thread::sleep(WAIT_TICK);
        waited += WAIT_TICK;
    }

    std::process::exit(EXIT_NOT_SIGNALLED);
}

/// Block, report, wait for `unblock` on stdin, then unblock and drain
fn blocked(signal: &str, mode: &str) -> Result<(), Box<dyn Error>> {
    let count = bind(signal, mode)?;
    block([signal])?;
    say("ready")?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    if line.trim() != "unblock" {
        usage();
    }

    // A default-action signal terminates the process inside this call
    unblock([signal])?;
    dispatch();
    say(&format!("handled {}", count.load(Ordering::SeqCst)))?;
    Ok(())
}

/// Send to self `times` times, then drain once
fn repeat(signal: &str, times: usize) -> Result<(), Box<dyn Error>> {
    let count = bind(signal, "handler")?;
    let target = Signal::new(signal)?;
    for _ in 0..times {
        target.send(None)?;
    }
    say("ready")?;

    let invoked = dispatch();
    say(&format!("handled {}", count.load(Ordering::SeqCst)))?;
    say(&serde_json::to_string(&SignalRegistry::global().stats())?)?;
    info!(invoked, "Repeat probe finished");
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["wait", signal] => wait(signal, "default"),
        ["wait", signal, mode] => wait(signal, mode),
        ["block", signal] => blocked(signal, "default"),
        ["block", signal, mode] => blocked(signal, mode),
        ["repeat", signal, times] => repeat(signal, times.parse().unwrap_or_else(|_| usage())),
        _ => usage(),
    }
}
