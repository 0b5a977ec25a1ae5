//! Line-based control console on stdin

use std::io::{self, BufRead, Write};

use color_eyre::eyre::{bail, eyre, Result as EyreResult, WrapErr};

use eurorack_dsp::{
    mixer::{ControlHandle, ParamId},
    AudioGraph, EngineConfig,
};

const HELP: &str = "\
commands:
  set <param> <value>   e.g. `set ch0.gain 800`, `set delay.time 300`
  get <param>
  trigger               start the envelope
  gate on|off
  reverb                restart the reverb predelay
  mute                  clear every tail
  status                effect summary
  params                every knob value
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Set(ParamId, i32),
    Get(ParamId),
    Trigger,
    Gate(bool),
    Reverb,
    Mute,
    Status,
    Params,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> EyreResult<Option<Command>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };

        let command = match verb {
            "set" => {
                let param = next_param(&mut words)?;
                let value = words
                    .next()
                    .ok_or_else(|| eyre!("usage: set <param> <value>"))?;
                let value = value
                    .parse()
                    .wrap_err_with(|| format!("`{}` is not an integer", value))?;
                Command::Set(param, value)
            }
            "get" => Command::Get(next_param(&mut words)?),
            "trigger" => Command::Trigger,
            "gate" => match words.next() {
                Some("on") => Command::Gate(true),
                Some("off") => Command::Gate(false),
                _ => bail!("usage: gate on|off"),
            },
            "reverb" => Command::Reverb,
            "mute" => Command::Mute,
            "status" => Command::Status,
            "params" => Command::Params,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command `{}` (try `help`)", other),
        };

        if let Some(extra) = words.next() {
            bail!("unexpected `{}`", extra);
        }
        Ok(Some(command))
    }
}

fn next_param<'a>(words: &mut impl Iterator<Item = &'a str>) -> EyreResult<ParamId> {
    let name = words.next().ok_or_else(|| eyre!("missing parameter name"))?;
    Ok(name.parse()?)
}

/// Rebuild the engine off the audio thread from the current knob values and
/// describe it. Envelope and tail state are not mirrored.
fn status(handle: &ControlHandle, config: &EngineConfig) -> EyreResult<String> {
    let mut mirror = AudioGraph::new(config)?;
    for (id, value) in handle.values() {
        mirror.set_param(id, value);
    }
    Ok(mirror.to_string())
}

fn execute(
    command: Command,
    handle: &mut ControlHandle,
    config: &EngineConfig,
) -> EyreResult<()> {
    match command {
        Command::Set(id, value) => {
            let stored = handle.set(id, value)?;
            if stored != value {
                println!("{} clamped to {}", id, stored);
            }
        }
        Command::Get(id) => println!("{} = {}", id, handle.get(id)?),
        Command::Trigger => handle.trigger()?,
        Command::Gate(on) => handle.gate(on)?,
        Command::Reverb => handle.trigger_reverb()?,
        Command::Mute => handle.mute()?,
        Command::Status => println!("{}", status(handle, config)?),
        Command::Params => {
            for (id, value) in handle.values() {
                println!("{:<22} {}", id.to_string(), value);
            }
        }
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
    Ok(())
}

/// Read commands until `quit` or end of input.
pub fn run(mut handle: ControlHandle, config: &EngineConfig) -> EyreResult<()> {
    println!("{}", HELP);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Ok(());
        }

        match Command::parse(&line) {
            Ok(None) => {}
            Ok(Some(Command::Quit)) => return Ok(()),
            Ok(Some(command)) => {
                if let Err(err) = execute(command, &mut handle, config) {
                    println!("error: {:#}", err);
                }
            }
            Err(err) => println!("error: {:#}", err),
        }
    }
}
