use std::{
    process::ExitStatus,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use eframe::egui;
use tracing::{error, warn};

use crate::supervisor::{Supervisor, SupervisorState};

pub const WINDOW_TITLE: &str = "Dashboard Launcher";
pub const WINDOW_SIZE: [f32; 2] = [300.0, 100.0];
pub const RUNNING_MESSAGE: &str = "Opening dashboard in browser...\n(keep this window open)";
const CONFIRM_TITLE: &str = "Quit dashboard";
const CONFIRM_MESSAGE: &str = "Do you really want to quit? This action is irreversible.";

pub fn lock(supervisor: &Mutex<Supervisor>) -> MutexGuard<'_, Supervisor> {
    supervisor.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn exited_message(status: ExitStatus) -> String {
    format!("Dashboard server exited unexpectedly\n({status})")
}

enum ConfirmChoice {
    Quit,
    Cancel,
}

pub struct LauncherApp {
    supervisor: Arc<Mutex<Supervisor>>,
    dashboard_url: String,
    message: String,
    closing: bool,
}

impl LauncherApp {
    pub fn new(supervisor: Arc<Mutex<Supervisor>>, dashboard_url: String) -> Self {
        Self {
            supervisor,
            dashboard_url,
            message: RUNNING_MESSAGE.to_string(),
            closing: false,
        }
    }

    fn handle_close_request(&mut self, ctx: &egui::Context) {
        if self.closing || !ctx.input(|i| i.viewport().close_requested()) {
            return;
        }
        match lock(&self.supervisor).request_close() {
            Ok(true) => ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose),
            Ok(false) => self.closing = true,
            Err(err) => {
                warn!(%err, "close request ignored");
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            }
        }
    }

    fn show_confirmation(&mut self, ctx: &egui::Context) {
        if lock(&self.supervisor).state() != SupervisorState::ConfirmPending {
            return;
        }

        let modal = egui::Modal::new(egui::Id::new(CONFIRM_TITLE)).show(ctx, |ui| {
            ui.heading(CONFIRM_TITLE);
            ui.label(CONFIRM_MESSAGE);
            ui.horizontal(|ui| {
                if ui.button("Quit").clicked() {
                    Some(ConfirmChoice::Quit)
                } else if ui.button("Cancel").clicked() {
                    Some(ConfirmChoice::Cancel)
                } else {
                    None
                }
            })
            .inner
        });
        let choice = match modal.inner {
            Some(choice) => Some(choice),
            None if modal.should_close() => Some(ConfirmChoice::Cancel),
            None => None,
        };

        match choice {
            Some(ConfirmChoice::Quit) => {
                if let Err(err) = lock(&self.supervisor).confirm_close() {
                    error!(%err, "failed to stop dashboard server");
                }
                self.closing = true;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            Some(ConfirmChoice::Cancel) => {
                if let Err(err) = lock(&self.supervisor).cancel_close() {
                    warn!(%err, "cancel ignored");
                }
            }
            None => {}
        }
    }

    fn ui(&mut self, ctx: &egui::Context) {
        if let Some(status) = lock(&self.supervisor).poll_server() {
            self.message = exited_message(status);
        }
        self.handle_close_request(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(self.message.as_str());
                ui.hyperlink(&self.dashboard_url);
            });
        });
        self.show_confirmation(ctx);
    }
}

impl eframe::App for LauncherApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui(ctx);
        ctx.request_repaint_after(Duration::from_millis(250));
    }
}
