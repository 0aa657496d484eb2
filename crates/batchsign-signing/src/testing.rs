//! Test doubles shared by the module tests

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use tracing::subscriber::DefaultGuard;

use crate::command::{CommandFailure, CommandOutput, CommandRunner, ShellCommand};

/// Runner that replays scripted results and records every command
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<Result<CommandOutput, CommandFailure>>>,
    fallback_success: bool,
    commands: Mutex<Vec<ShellCommand>>,
}

impl ScriptedRunner {
    /// Every command succeeds
    pub fn succeeding() -> Self {
        Self::with_fallback(true)
    }

    /// Every command fails
    pub fn failing() -> Self {
        Self::with_fallback(false)
    }

    fn with_fallback(fallback_success: bool) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback_success,
            commands: Mutex::new(Vec::new()),
        }
    }

    /// Queue `count` failures ahead of the fallback behaviour
    pub fn then_fail(self, count: usize) -> Self {
        {
            let mut responses = self.responses.lock().unwrap();
            for _ in 0..count {
                responses.push_back(Err(exit_failure()));
            }
        }
        self
    }

    /// Queue one success ahead of the fallback behaviour
    pub fn then_succeed(self) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(CommandOutput::default()));
        self
    }

    /// Command lines run so far
    pub fn lines(&self) -> Vec<String> {
        self.commands
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.line().to_string())
            .collect()
    }

    /// Commands run so far
    pub fn commands(&self) -> Vec<ShellCommand> {
        self.commands.lock().unwrap().clone()
    }
}

fn exit_failure() -> CommandFailure {
    CommandFailure::Exited {
        code: Some(1),
        stdout: String::new(),
        stderr: "SignTool Error: scripted failure".to_string(),
    }
}

#[async_trait::async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &ShellCommand) -> Result<CommandOutput, CommandFailure> {
        self.commands.lock().unwrap().push(command.clone());
        let scripted = self.responses.lock().unwrap().pop_front();
        match scripted {
            Some(result) => result,
            None if self.fallback_success => Ok(CommandOutput::default()),
            None => Err(exit_failure()),
        }
    }
}

/// In-memory sink for log output emitted on the current thread
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Route this thread's events into the buffer until the guard drops
    pub fn install(&self) -> DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Everything logged so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
