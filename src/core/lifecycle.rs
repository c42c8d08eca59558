//! Process lifecycle - spawn, exit, restart and shutdown policy for panes

use std::time::{Duration, Instant};

use crate::config::WaitPolicy;
use crate::wm::manager::Multiplexer;
use crate::wm::pane::PaneFlags;

use super::pty::{ProcessId, SpawnRequest};

/// Grace period between an injected interrupt and a hard kill
pub const INTERRUPT_GRACE: Duration = Duration::from_millis(500);
/// Delay before exiting once every pane has terminated
pub const AUTO_EXIT_DELAY: Duration = Duration::from_millis(2000);
/// Delay between killing everything and leaving the event loop
pub const EXIT_DELAY: Duration = Duration::from_millis(50);
/// Startup countdown resolution
const COUNTDOWN_STEP: Duration = Duration::from_millis(1000);

/// Scheduled lifecycle work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Startup countdown of a delayed pane; spawns once `deadline` passes
    Countdown { pane: usize, deadline: Instant },
    /// Spawn a pane's command unless it is already running
    Spawn { pane: usize },
    /// Manual restart, after the interrupt grace period
    RestartKill { pane: usize },
    /// Graceful shutdown, after the interrupt grace period
    ShutdownKill,
    /// Graceful shutdown, after the kill grace period
    ShutdownExit,
    /// Every pane has terminated
    AutoExit,
    /// Leave the event loop
    Exit,
}

const NOTICE_GREEN: &str = "32";
const NOTICE_YELLOW: &str = "33";
const NOTICE_RED: &str = "31";

fn notice(color: &str, text: &str) -> String {
    format!(
        "\r\n\x1b[{c};7m ..::\x1b[1m {t} \x1b[22m::.. \x1b[0m\r\n\r\n",
        c = color,
        t = text
    )
}

impl Multiplexer {
    /// Start a freshly provisioned pane, honoring its startup delay
    pub(crate) fn start_pane(&mut self, index: usize) {
        let wait = self.panes[index].primary().map(|spec| spec.wait).unwrap_or(0);
        if wait == 0 {
            self.spawn_pane(index);
            return;
        }
        let deadline = self.now + Duration::from_millis(wait);
        self.countdown(index, deadline);
    }

    /// Update the countdown badge and spawn once the deadline has passed
    fn countdown(&mut self, index: usize, deadline: Instant) {
        self.panes[index].countdown_timer = None;
        if self.now >= deadline {
            self.spawn_pane(index);
            return;
        }
        let left = deadline - self.now;
        self.panes[index].countdown = Some((left.as_millis() as u64).div_ceil(1000));
        let next = (self.now + COUNTDOWN_STEP).min(deadline);
        let id = self.timers.schedule(
            next,
            Task::Countdown {
                pane: index,
                deadline,
            },
        );
        self.panes[index].countdown_timer = Some(id);
        self.request_repaint();
    }

    /// Launch the pane's current command
    pub(crate) fn spawn_pane(&mut self, index: usize) {
        if self.shutting_down {
            return;
        }
        if let Some(id) = self.panes[index].countdown_timer.take() {
            self.timers.cancel(id);
        }
        self.panes[index].countdown = None;
        self.uncount(index);

        let pane = &mut self.panes[index];
        let (cols, rows) = pane.inner_size();
        let request = SpawnRequest::shell_command(&pane.cmd, pane.cwd.as_deref(), cols, rows);

        match self.spawner.spawn(index, &request) {
            Ok(process) => {
                tracing::info!(
                    "pane {}: started process {}: {}",
                    pane.ordinal,
                    process.id(),
                    pane.cmd
                );
                pane.session.attach(process);
                pane.flags.remove(PaneFlags::ERROR);
            }
            Err(e) => {
                tracing::error!("pane {}: spawn failed: {}", pane.ordinal, e);
                let mut block = notice(NOTICE_RED, &format!("Error: {}", e));
                for line in [
                    format!("cmd: {}", pane.cmd),
                    format!("shell: {}", request.shell),
                    format!("cwd: {}", request.cwd.display()),
                    format!("args: {}", request.args.join(",")),
                ] {
                    block.push_str(&format!("\x1b[33;7m{}\x1b[0m\r\n", line));
                }
                block.push_str("\r\n");
                pane.session.write_notice(&block);
            }
        }
        pane.restarting = false;
        self.request_repaint();
    }

    /// Apply the exit policy to a process exit
    pub(crate) fn handle_exit(&mut self, index: usize, process: ProcessId, code: u32) {
        let Some(pane) = self.panes.get_mut(index) else {
            return;
        };
        if pane.session.process_id() != Some(process) {
            tracing::debug!("pane {}: dropping stale exit of process {}", pane.ordinal, process);
            return;
        }
        pane.session.detach();
        tracing::info!("pane {}: process {} exited with code {}", pane.ordinal, process, code);

        if code == 0 && pane.chain.len() > 1 {
            let next = pane.cursor + 1;
            let left = pane.chain.len() - next;
            pane.session
                .write_notice(&notice(NOTICE_YELLOW, &format!("PROGRAM TERMINATED ({} left)", left)));
            if next < pane.chain.len() {
                pane.bind(next);
                self.spawn_pane(index);
                return;
            }
            pane.cursor = 0;
        }

        if code == 0 {
            pane.session.write_notice(&notice(NOTICE_GREEN, "PROGRAM TERMINATED"));
        } else {
            pane.session
                .write_notice(&notice(NOTICE_RED, &format!("PROGRAM TERMINATED (code: {})", code)));
            pane.flags.insert(PaneFlags::ERROR);
        }
        let (restart, delay) = pane
            .primary()
            .map(|spec| (spec.restart, spec.delay))
            .unwrap_or_default();
        let restarting = pane.restarting;
        self.request_repaint();

        if restart && !restarting {
            if delay > 0 {
                self.timers
                    .schedule(self.now + Duration::from_millis(delay), Task::Spawn { pane: index });
            } else {
                self.spawn_pane(index);
            }
            return;
        }

        self.count_terminated(index, code);
    }

    /// Record a pane as done and exit once all are, if the wait policy allows
    fn count_terminated(&mut self, index: usize, code: u32) {
        if self.panes[index].counted.is_some() {
            return;
        }
        self.panes[index].counted = Some(code);
        self.terminated += 1;
        if code != 0 {
            self.terminated_error += 1;
        }
        if self.all_terminated() && self.wait_policy_allows_exit() {
            tracing::info!("all panes terminated, exiting shortly");
            self.timers.schedule(self.now + AUTO_EXIT_DELAY, Task::AutoExit);
        }
    }

    /// Undo the termination count of a pane that runs again
    fn uncount(&mut self, index: usize) {
        if let Some(code) = self.panes[index].counted.take() {
            self.terminated -= 1;
            if code != 0 {
                self.terminated_error -= 1;
            }
        }
    }

    fn all_terminated(&self) -> bool {
        self.terminated >= self.panes.len()
    }

    fn wait_policy_allows_exit(&self) -> bool {
        match &self.options.wait {
            WaitPolicy::Exit => true,
            WaitPolicy::ExitUnlessError => self.terminated_error == 0,
            WaitPolicy::Stay(_) => false,
        }
    }

    /// Interrupt the pane, then kill and respawn it from the start of its chain
    pub(crate) fn restart_pane(&mut self, index: usize) {
        let pane = &mut self.panes[index];
        tracing::info!("pane {}: manual restart", pane.ordinal);
        pane.restarting = true;
        pane.session.interrupt();
        self.timers
            .schedule(self.now + INTERRUPT_GRACE, Task::RestartKill { pane: index });
    }

    fn finish_restart(&mut self, index: usize) {
        let pane = &mut self.panes[index];
        pane.session.kill();
        if !pane.chain.is_empty() {
            pane.bind(0);
        }
        self.uncount(index);

        let delay = self.panes[index].primary().map(|spec| spec.delay).unwrap_or(0);
        if delay > 0 {
            self.timers
                .schedule(self.now + Duration::from_millis(delay), Task::Spawn { pane: index });
        } else {
            self.spawn_pane(index);
        }
    }

    /// Stop a pane for good; counts like an exit
    pub(crate) fn stop_pane(&mut self, index: usize) {
        let pane = &mut self.panes[index];
        if let Some(id) = pane.countdown_timer.take() {
            self.timers.cancel(id);
        }
        pane.countdown = None;
        if let Some(process) = pane.session.kill() {
            tracing::info!("pane {}: stopped process {}", pane.ordinal, process);
            pane.session.write_notice(&notice(NOTICE_GREEN, "PROGRAM STOPPED"));
            self.count_terminated(index, 0);
        }
        self.request_repaint();
    }

    /// Spawn a pane that has nothing running
    pub(crate) fn resume_pane(&mut self, index: usize) {
        if !self.panes[index].session.has_process() {
            self.spawn_pane(index);
        }
    }

    /// Interrupt everything, then kill, then exit
    pub fn shutdown(&mut self) {
        tracing::info!("graceful shutdown requested");
        for pane in &mut self.panes {
            pane.session.interrupt();
        }
        self.shutting_down = true;
        self.request_repaint();
        self.timers.schedule(self.now + INTERRUPT_GRACE, Task::ShutdownKill);
    }

    fn kill_all(&mut self) {
        for pane in &mut self.panes {
            if let Some(id) = pane.countdown_timer.take() {
                self.timers.cancel(id);
            }
            pane.countdown = None;
            pane.session.kill();
        }
    }

    /// Kill everything that remains and leave the event loop shortly after
    pub fn terminate(&mut self) {
        self.shutting_down = true;
        self.kill_all();
        self.timers.schedule(self.now + EXIT_DELAY, Task::Exit);
    }

    pub(crate) fn run_task(&mut self, task: Task) {
        match task {
            Task::Countdown { pane, deadline } => self.countdown(pane, deadline),
            Task::Spawn { pane } => self.resume_pane(pane),
            Task::RestartKill { pane } => self.finish_restart(pane),
            Task::ShutdownKill => {
                self.kill_all();
                self.timers.schedule(self.now + INTERRUPT_GRACE, Task::ShutdownExit);
            }
            Task::ShutdownExit => self.terminate(),
            Task::AutoExit => {
                // A restart may have happened meanwhile
                if self.all_terminated() && self.wait_policy_allows_exit() {
                    self.terminate();
                }
            }
            Task::Exit => self.request_exit(),
        }
    }
}
