//! Native window for eyeballing an annotated thumbnail.

use eframe::{App, Frame, egui};
use egui::{ColorImage, TextureHandle, TextureOptions, Visuals};
use image::RgbImage;

/// Application state for the viewer window
struct ThumbnailViewer {
    /// Pixels waiting to be uploaded on the first frame
    pending: Option<ColorImage>,
    /// Texture holding the thumbnail once uploaded
    texture: Option<TextureHandle>,
}

impl App for ThumbnailViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        if let Some(image) = self.pending.take() {
            self.texture = Some(ctx.load_texture("thumbnail", image, TextureOptions::default()));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(tex) = &self.texture {
                ui.image(tex);
            }
        });
    }
}

/// Opens a window showing `image`; returns once the user closes it
pub fn show(window_name: &str, image: &RgbImage) -> Result<(), eframe::Error> {
    let (width, height) = image.dimensions();
    let pixels = ColorImage::from_rgb([width as usize, height as usize], image.as_raw());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(window_name)
            .with_inner_size([width as f32, height as f32]),
        ..Default::default()
    };
    eframe::run_native(
        window_name,
        options,
        Box::new(move |cc| {
            // Use dark theme visuals
            cc.egui_ctx.set_visuals(Visuals::dark());
            Box::new(ThumbnailViewer { pending: Some(pixels), texture: None })
        }),
    )
}
