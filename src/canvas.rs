// Image window: shows the picture at its natural size and turns left-button
// drags into grey occlusions. Runs on eframe's event loop until closed.

use crate::occlusion::{DragState, Occlusion, Point, Region};
use anyhow::Result;
use egui::{Color32, ColorImage, Context, Pos2, Rect, Sense, Stroke, TextureHandle, TextureOptions};
use image::DynamicImage;
use log::info;
use std::cell::RefCell;
use std::rc::Rc;

pub const WINDOW_TITLE: &str = "MLWL Image Occlusion";

/// Window showing the image; left-drag adds a grey occlusion.
pub struct OcclusionApp {
    texture: TextureHandle,
    image_size: [usize; 2],
    drag: DragState,
    // Shared with `run`, which reads it after the window closes.
    result: Rc<RefCell<Vec<Occlusion>>>,
}

impl OcclusionApp {
    fn new(cc: &eframe::CreationContext<'_>, image: ColorImage, result: Rc<RefCell<Vec<Occlusion>>>) -> Self {
        let image_size = image.size;
        let texture = cc.egui_ctx.load_texture("occlusion-image", image, TextureOptions::default());
        Self {
            texture,
            image_size,
            drag: DragState::new(),
            result,
        }
    }

    fn handle_pointer(&mut self, ctx: &Context, response: &egui::Response, canvas: Rect) {
        let (pressed, released, pos) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
            )
        });
        let Some(pos) = pos else { return };
        let point = pointer_to_pixel(pos, canvas, self.image_size);
        if step_drag(&mut self.drag, point, pressed && response.hovered(), released) {
            *self.result.borrow_mut() = self.drag.occlusions().to_vec();
        }
    }

    fn draw(&self, painter: &egui::Painter, canvas: Rect) {
        let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        painter.rect_filled(canvas, 0.0, Color32::BLACK);
        painter.image(self.texture.id(), canvas, uv, Color32::WHITE);

        for occlusion in self.drag.occlusions() {
            let [r, g, b, a] = occlusion.color;
            painter.rect_filled(
                to_screen_rect(&occlusion.region, canvas),
                0.0,
                Color32::from_rgba_unmultiplied(r, g, b, a),
            );
        }

        if let Some(preview) = self.drag.preview() {
            painter.rect_stroke(
                to_screen_rect(&preview, canvas),
                0.0,
                Stroke::new(1.0, Color32::from_rgb(128, 128, 128)),
            );
        }
    }
}

/// Screen position to image pixel, clamped to the image.
pub fn pointer_to_pixel(pos: Pos2, canvas: Rect, size: [usize; 2]) -> Point {
    let rel = pos - canvas.min;
    let x = rel.x.round().clamp(0.0, size[0] as f32) as u32;
    let y = rel.y.round().clamp(0.0, size[1] as f32) as u32;
    Point::new(x, y)
}

/// Feed one frame of pointer input to the drag. A press and a release in
/// the same frame both apply. Returns true when an occlusion was added.
fn step_drag(drag: &mut DragState, point: Point, pressed: bool, released: bool) -> bool {
    if pressed {
        drag.press(point);
    }
    if released {
        return drag.release(point).is_some();
    }
    if drag.is_drawing() {
        drag.motion(point);
    }
    false
}

fn to_screen_rect(region: &Region, canvas: Rect) -> Rect {
    Rect::from_min_size(
        canvas.min + egui::vec2(region.x as f32, region.y as f32),
        egui::vec2(region.width as f32, region.height as f32),
    )
}

impl eframe::App for OcclusionApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let size = egui::vec2(self.image_size[0] as f32, self.image_size[1] as f32);
                let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
                let canvas = response.rect;
                self.handle_pointer(ctx, &response, canvas);
                self.draw(&painter, canvas);
            });
    }
}

fn to_color_image(image: &DynamicImage) -> ColorImage {
    let rgba = image.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    ColorImage::from_rgba_unmultiplied(size, rgba.as_raw())
}

/// Open the window and block until it is closed. Returns the occlusions
/// drawn, in the order they were drawn.
pub fn run(image: &DynamicImage) -> Result<Vec<Occlusion>> {
    let color_image = to_color_image(image);
    let size = egui::vec2(image.width() as f32, image.height() as f32);
    let native_options = eframe::NativeOptions {
        initial_window_size: Some(size),
        resizable: false,
        ..Default::default()
    };

    let result = Rc::new(RefCell::new(Vec::new()));
    let app_result = Rc::clone(&result);
    eframe::run_native(
        WINDOW_TITLE,
        native_options,
        Box::new(move |cc| Box::new(OcclusionApp::new(cc, color_image, app_result))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to open the image window: {}", e))?;

    let occlusions = result.take();
    info!("{} rectangle(s) drawn", occlusions.len());
    Ok(occlusions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Rect {
        Rect::from_min_size(egui::pos2(10.0, 20.0), egui::vec2(100.0, 50.0))
    }

    #[test]
    fn pointer_is_offset_by_canvas_origin() {
        let p = pointer_to_pixel(egui::pos2(40.0, 45.0), canvas(), [100, 50]);
        assert_eq!(p, Point::new(30, 25));
    }

    #[test]
    fn pointer_outside_canvas_is_clamped() {
        let size = [100, 50];
        assert_eq!(pointer_to_pixel(egui::pos2(0.0, 5.0), canvas(), size), Point::new(0, 0));
        assert_eq!(pointer_to_pixel(egui::pos2(500.0, 500.0), canvas(), size), Point::new(100, 50));
        assert_eq!(pointer_to_pixel(egui::pos2(-3.0, 40.0), canvas(), size), Point::new(0, 20));
    }

    #[test]
    fn fractional_pointer_rounds_to_nearest_pixel() {
        let size = [100, 50];
        assert_eq!(pointer_to_pixel(egui::pos2(12.4, 20.6), canvas(), size), Point::new(2, 1));
        assert_eq!(pointer_to_pixel(egui::pos2(109.7, 69.5), canvas(), size), Point::new(100, 50));
    }

    #[test]
    fn press_and_release_in_one_frame_end_the_drag() {
        let mut drag = DragState::new();
        assert!(!step_drag(&mut drag, Point::new(4, 4), true, true));
        assert!(!drag.is_drawing());
        assert_eq!(drag.preview(), None);
    }

    #[test]
    fn drag_across_frames_adds_occlusion() {
        let mut drag = DragState::new();
        assert!(!step_drag(&mut drag, Point::new(1, 1), true, false));
        assert!(!step_drag(&mut drag, Point::new(5, 6), false, false));
        assert_eq!(drag.preview(), Some(Region { x: 1, y: 1, width: 4, height: 5 }));
        assert!(step_drag(&mut drag, Point::new(8, 9), false, true));
        assert_eq!(drag.occlusions()[0].region, Region { x: 1, y: 1, width: 7, height: 8 });
    }
}
