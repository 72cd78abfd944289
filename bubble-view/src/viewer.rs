//! Interactive bubble scene viewer built with eframe/egui.
//!
//! [`Viewer`] owns a [`Scene`] and the controllers around it, turns egui
//! pointer and scroll input into press and pinch events, and paints the
//! bubbles every frame.

use bubble_core::{
    Bubble, Camera, CursorUpdate, Dataset, EventLog, InteractionController, Preset, Scene,
    SceneConfig, SceneEvent, TimeRangeEngine, TimelineConfig,
};
use eframe::App;
use glam::Vec2;
use tracing::info;

/// Seconds without zoom input after which a pinch gesture ends.
const PINCH_IDLE: f64 = 0.25;
const RECENT_EVENTS: usize = 8;

/// Main application state for the viewer.
///
/// The per-frame update is:
/// 1. Handle panel buttons and the day slider.
/// 2. Forward pointer and zoom input to the [`InteractionController`].
/// 3. If `running`, advance the scene by the frame time.
/// 4. Paint the bubbles.
pub struct Viewer {
    scene: Scene,
    interaction: InteractionController,
    timeline: TimeRangeEngine,
    events: EventLog,
    recent: Vec<String>,

    running: bool,
    day: f32,
    last_update: Option<CursorUpdate>,

    pressing: bool,
    pinch_scale: f32,
    last_zoom_time: f64,
}

impl Viewer {
    /// Creates a viewer with an empty scene driven by `dataset`.
    pub fn new(dataset: Dataset) -> Self {
        let mut scene = Scene::new(SceneConfig {
            remove_on_long_press: true,
            ..SceneConfig::default()
        });
        let events = EventLog::default();
        scene.set_delegate(events.clone());
        let interaction = InteractionController::new(Camera::centered(scene.size()));

        Self {
            scene,
            interaction,
            timeline: TimeRangeEngine::new(dataset, TimelineConfig::default()),
            events,
            recent: Vec::with_capacity(RECENT_EVENTS),
            running: true,
            day: 0.0,
            last_update: None,
            pressing: false,
            pinch_scale: 1.0,
            last_zoom_time: 0.0,
        }
    }

    fn set_day(&mut self, day: f32) {
        self.day = day;
        self.last_update = Some(self.timeline.set_cursor(&mut self.scene, day));
    }

    fn attach_habits(&mut self) -> usize {
        let Some(update) = &self.last_update else {
            return 0;
        };
        self.timeline.attach_candidates(&mut self.scene, update)
    }

    fn add_sub_child(&mut self) {
        let preset = Preset::random(self.scene.rng());
        self.scene.add_child_to_last(preset);
    }

    /// Keeps the scene and camera matched to the drawing area.
    fn fit_to(&mut self, rect: egui::Rect) {
        let size = Vec2::new(rect.width(), rect.height());
        if size.x > 0.0 && size.y > 0.0 && self.scene.size() != size {
            self.scene.resize(size);
            self.interaction.camera_mut().position = size * 0.5;
        }
    }

    fn drain_events(&mut self) {
        for event in self.events.take() {
            let line = match &event {
                SceneEvent::Selected { name, .. } => format!("selected {name}"),
                SceneEvent::Deselected { name, .. } => format!("deselected {name}"),
                SceneEvent::Removed { name, .. } => format!("removed {name}"),
            };
            info!(event = %line, "scene event");
            self.recent.push(line);
        }
        if self.recent.len() > RECENT_EVENTS {
            let overflow = self.recent.len() - RECENT_EVENTS;
            self.recent.drain(..overflow);
        }
    }

    /// Converts a world-space position to screen-space.
    ///
    /// The camera offset is applied first, then the result is centered in
    /// `rect` with the y-axis flipped so positive y goes up in world space.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let v = self.interaction.camera().world_to_view(p);
        let center = rect.center();
        egui::pos2(center.x + v.x, center.y - v.y)
    }

    /// Inverse of [`Viewer::world_to_screen`].
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let v = Vec2::new(p.x - center.x, center.y - p.y);
        self.interaction.camera().view_to_world(v)
    }

    /// Builds the top panel with scene commands.
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }
                if ui.button("Add").clicked() {
                    self.scene.add_random();
                }
                if ui.button("Add sub-child").clicked() {
                    self.add_sub_child();
                }
                if ui.button("Attach habits").clicked() {
                    self.attach_habits();
                }
                if ui.button("Remove last").clicked() {
                    self.scene.remove_last();
                }
                if ui.button("Reset").clicked() {
                    self.scene.reset();
                }

                ui.separator();
                let mut multi = self.scene.config().allows_multiple_selection;
                if ui.checkbox(&mut multi, "Multi-select").changed() {
                    self.scene.set_allows_multiple_selection(multi);
                }
                let mut long_press = self.scene.config().remove_on_long_press;
                if ui.checkbox(&mut long_press, "Hold to remove").changed() {
                    self.scene.set_remove_on_long_press(long_press);
                }
            });
        });
    }

    /// Builds the bottom status bar.
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("zoom = {:.2}", 1.0 / self.interaction.camera().scale));
                ui.label(format!("speed = {:.2}", self.scene.physics_speed()));
                ui.separator();
                ui.label(format!("bubbles = {}", self.scene.len()));
                ui.label(format!(
                    "selected = {}",
                    self.scene.selection().selected().len()
                ));
            });
        });
    }

    /// Builds the right-hand panel with the day cursor and recent events.
    fn ui_timeline_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("timeline_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Timeline");
                let mut day = self.day;
                if ui
                    .add(egui::Slider::new(&mut day, 0.0..=366.0).text("day"))
                    .changed()
                {
                    self.set_day(day);
                }

                if let Some(update) = &self.last_update {
                    ui.separator();
                    ui.label(format!("day {}", update.day));
                    for (name, alpha) in &update.in_range {
                        ui.label(format!("{name}: alpha {alpha:.1}"));
                    }
                    ui.label(format!("habits in range: {}", update.candidates.len()));
                }

                ui.separator();
                ui.label("Events");
                for line in self.recent.iter().rev() {
                    ui.label(line);
                }
            });
    }

    /// Forwards pointer presses to the interaction controller.
    fn handle_pointer(&mut self, ctx: &egui::Context, rect: egui::Rect) {
        let (pressed, released, pos, time) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
                i.time,
            )
        });
        let Some(pos) = pos else {
            return;
        };
        let world = self.screen_to_world(pos, rect);

        if pressed && rect.contains(pos) {
            self.pressing = true;
            self.interaction.press_begin(&self.scene, world, time);
        } else if self.pressing && !released {
            self.interaction.press_move(&mut self.scene, world);
        }

        if released && self.pressing {
            self.pressing = false;
            let outcome = self.interaction.press_end(&mut self.scene, world, time);
            tracing::debug!(?outcome, "press ended");
        }
    }

    /// Maps scroll and pinch input to pinch gestures on the camera.
    fn handle_zoom(&mut self, ctx: &egui::Context) {
        let (zoom, scroll, time) =
            ctx.input(|i| (i.zoom_delta(), i.raw_scroll_delta.y, i.time));
        let factor = if zoom != 1.0 {
            zoom
        } else if scroll != 0.0 {
            (1.0 + scroll * 0.001).clamp(0.5, 2.0)
        } else {
            1.0
        };

        if factor != 1.0 {
            if !self.interaction.is_pinching() {
                self.interaction.pinch_begin(&mut self.scene);
                self.pinch_scale = 1.0;
            }
            self.pinch_scale *= factor;
            self.interaction.pinch_change(self.pinch_scale);
            self.last_zoom_time = time;
        } else if self.interaction.is_pinching() && time - self.last_zoom_time > PINCH_IDLE {
            self.interaction.pinch_end(&mut self.scene, self.pinch_scale);
        }
    }

    fn paint_bubble(&self, painter: &egui::Painter, rect: egui::Rect, bubble: &Bubble) {
        let camera_scale = self.interaction.camera().scale;
        let center = self.world_to_screen(bubble.body.position, rect);
        let alpha = bubble.alpha();
        let r = bubble.radius() * bubble.scale() / camera_scale;

        painter.circle_filled(center, r, to_color32(bubble.fill().to_rgba8(), alpha));
        if bubble.is_selected() {
            painter.circle_stroke(
                center,
                r,
                egui::Stroke::new(2.0, egui::Color32::WHITE.gamma_multiply(alpha)),
            );
        }

        for child in bubble.children() {
            let world = bubble.body.position + child.body.position * bubble.scale();
            let c = self.world_to_screen(world, rect);
            let cr = child.radius() * bubble.scale() / camera_scale;
            let a = alpha * child.alpha();
            painter.circle_filled(c, cr, to_color32(child.color.to_rgba8(), a));
            painter.text(
                c,
                egui::Align2::CENTER_CENTER,
                child.label(),
                egui::FontId::proportional(11.0),
                egui::Color32::WHITE.gamma_multiply(a),
            );
        }

        if bubble.children().is_empty() {
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                &bubble.label,
                egui::FontId::proportional(12.0),
                to_color32(bubble.label_color().to_rgba8(), alpha),
            );
        }
    }

    /// Builds the central panel where bubbles are drawn and interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            self.fit_to(rect);
            self.handle_pointer(ctx, rect);
            if response.hovered() {
                self.handle_zoom(ctx);
            }

            if self.running {
                let dt = ctx.input(|i| i.stable_dt).min(0.1);
                self.scene.tick(dt);
                ctx.request_repaint();
            }

            painter.rect_filled(rect, 0.0, egui::Color32::from_gray(250));
            for bubble in self.scene.bubbles() {
                self.paint_bubble(&painter, rect, bubble);
            }
        });
    }
}

fn to_color32([r, g, b, a]: [u8; 4], alpha: f32) -> egui::Color32 {
    let a = (a as f32 * alpha.clamp(0.0, 1.0)).round() as u8;
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

impl App for Viewer {
    /// eframe callback that builds all panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_timeline_panel(ctx);
        self.ui_central_panel(ctx);
        self.drain_events();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(0.0, 0.0), egui::vec2(800.0, 600.0))
    }

    #[test]
    fn world_to_screen_and_back_is_roundtrip() {
        let mut viewer = Viewer::new(Dataset::demo());
        viewer.interaction.camera_mut().scale = 2.0;
        viewer.interaction.camera_mut().position = Vec2::new(15.0, -7.0);
        let rect = test_rect();

        let eps = 1e-3;
        for p in [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, -5.0),
            Vec2::new(-3.5, 8.25),
        ] {
            let screen = viewer.world_to_screen(p, rect);
            let back = viewer.screen_to_world(screen, rect);
            assert!(
                (back - p).length() < eps,
                "roundtrip mismatch: p={p:?}, back={back:?}"
            );
        }
    }

    #[test]
    fn scene_center_maps_to_rect_center() {
        let mut viewer = Viewer::new(Dataset::demo());
        let rect = test_rect();
        viewer.fit_to(rect);

        let screen = viewer.world_to_screen(Vec2::new(400.0, 300.0), rect);
        assert_eq!(screen, rect.center());
        assert_eq!(viewer.scene.size(), Vec2::new(800.0, 600.0));
    }

    #[test]
    fn day_changes_drive_scene_and_habits_attach() {
        let mut viewer = Viewer::new(Dataset::demo());

        viewer.set_day(190.0);
        assert!(viewer.scene.contains("Old Aim"));
        assert!(viewer.scene.contains("Today Aim"));
        assert!(!viewer.scene.contains("Future Aim"));

        assert_eq!(viewer.attach_habits(), 5);
        viewer.add_sub_child();
        let children: usize = viewer
            .scene
            .bubbles()
            .iter()
            .map(|b| b.children().len())
            .sum();
        assert_eq!(children, 6);
    }

    #[test]
    fn recent_events_are_capped() {
        let mut viewer = Viewer::new(Dataset::demo());
        viewer.set_day(190.0);
        let ids: Vec<_> = viewer.scene.bubbles().iter().map(|b| b.id()).collect();
        for _ in 0..5 {
            for &id in &ids {
                viewer.scene.tap(id);
            }
        }

        viewer.drain_events();

        assert_eq!(viewer.recent.len(), RECENT_EVENTS);
        assert!(viewer.events.is_empty());
    }
}
