//! egui frontend
//!
//! One window: device picker, start/stop toggle, scalar readouts and the
//! scrolling waveform plot. All acquisition state lives in the
//! [`AcquisitionController`]; the frontend only drains the sample queue on
//! its redraw tick and renders what it finds.

pub mod window;

pub use window::WindowBuffer;

use crate::backend::{available_devices, AcquisitionController};
use crate::config::AppConfig;
use crate::types::{DeviceDescriptor, Readouts};
use egui_plot::{Line, Plot, PlotPoints};
use std::time::{Duration, Instant};

/// The application window
pub struct PulseVisApp {
    controller: AcquisitionController,
    window: WindowBuffer,
    devices: Vec<DeviceDescriptor>,
    selected: Option<usize>,
    last_error: Option<String>,
    tick_interval: Duration,
    last_tick: Instant,
}

impl PulseVisApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let devices = available_devices();
        let selected = if devices.is_empty() { None } else { Some(0) };
        let window = WindowBuffer::new(config.acquisition.window_size);
        let tick_interval = config.acquisition.tick_interval();

        Self {
            controller: AcquisitionController::new(config),
            window,
            devices,
            selected,
            last_error: None,
            tick_interval,
            last_tick: Instant::now(),
        }
    }

    fn rescan_devices(&mut self) {
        let previous = self
            .selected
            .and_then(|i| self.devices.get(i))
            .map(|d| d.id.clone());
        self.devices = available_devices();
        self.selected = match previous {
            Some(id) => self.devices.iter().position(|d| d.id == id),
            None => None,
        }
        .or(if self.devices.is_empty() { None } else { Some(0) });
    }

    fn toggle_acquisition(&mut self) {
        if self.controller.is_running() {
            self.controller.stop();
            self.window.clear();
            self.last_error = None;
            return;
        }

        let device = self.selected.and_then(|i| self.devices.get(i));
        match self.controller.start(device) {
            Ok(()) => {
                self.window.clear();
                self.last_error = None;
            }
            Err(e) if e.is_retryable() => {
                // Access grant still in flight; the user just presses
                // start again once it lands.
                self.last_error = Some(format!("Not ready yet, try again: {}", e));
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
            }
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let selected_label = self
                .selected
                .and_then(|i| self.devices.get(i))
                .map(|d| d.label.clone())
                .unwrap_or_else(|| "No device".to_string());

            egui::ComboBox::from_label("Device")
                .selected_text(selected_label)
                .show_ui(ui, |ui| {
                    for (i, device) in self.devices.iter().enumerate() {
                        ui.selectable_value(&mut self.selected, Some(i), &device.label);
                    }
                });

            if ui.button("Rescan").clicked() {
                self.rescan_devices();
            }

            let caption = if self.controller.is_running() {
                "Stop acquisition"
            } else {
                "Start acquisition"
            };
            if ui.button(caption).clicked() {
                self.toggle_acquisition();
            }

            ui.label(format!("State: {}", self.controller.phase()));
        });
    }

    fn readout_row(&self, ui: &mut egui::Ui, readouts: Readouts) {
        ui.horizontal(|ui| {
            ui.label(match readouts.bpm {
                Some(v) => format!("BPM={}", v),
                None => "BPM=--".to_string(),
            });
            ui.separator();
            ui.label(match readouts.ibi {
                Some(v) => format!("IBI={}", v),
                None => "IBI=--".to_string(),
            });
            ui.separator();
            ui.label(match readouts.temperature {
                Some(v) => format!("Temperature={}", v),
                None => "Temperature=--".to_string(),
            });
        });
    }

    /// Drain the queue into the window at the configured tick rate
    fn maybe_tick(&mut self) {
        if self.last_tick.elapsed() < self.tick_interval {
            return;
        }
        self.last_tick = Instant::now();

        if let Some(consumer) = self.controller.consumer() {
            self.window.on_tick(consumer);
        }
    }
}

impl eframe::App for PulseVisApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(message) = self.controller.poll_health() {
            self.last_error = Some(message);
            self.window.clear();
        }
        self.maybe_tick();

        let readouts = self
            .controller
            .readouts()
            .read()
            .map(|r| *r)
            .unwrap_or_default();

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            self.controls(ui);
            self.readout_row(ui, readouts);
            if let Some(error) = &self.last_error {
                ui.colored_label(egui::Color32::LIGHT_RED, error);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let points = PlotPoints::from(self.window.points().to_vec());
            let line = Line::new("waveform", points);
            Plot::new("waveform_plot")
                .include_x(0.0)
                .include_x(self.window.capacity() as f64)
                .allow_drag(false)
                .allow_zoom(false)
                .allow_scroll(false)
                .show(ui, |plot_ui| {
                    plot_ui.line(line);
                });
        });

        // Keep draining even when no input events arrive.
        ctx.request_repaint_after(self.tick_interval);
    }
}
