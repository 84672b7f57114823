use egui::{Color32, Pos2, Rect, Rounding, Stroke, Vec2};

use crate::engine::layout::ItemBounds;
use crate::render::driver::{DrawHeader, DrawItem, RenderDriver};
use crate::ui::theme;

/// Paints the scene with an egui [`Painter`](egui::Painter). Lives for one
/// frame; `origin` is the canvas top-left and `height` the canvas extent
/// grid lines and markers span.
pub struct EguiDriver<'a> {
    painter: &'a egui::Painter,
    origin: Pos2,
    height: f32,
}

impl<'a> EguiDriver<'a> {
    pub fn new(painter: &'a egui::Painter, origin: Pos2, height: f32) -> Self {
        Self {
            painter,
            origin,
            height,
        }
    }

    fn rect(&self, b: ItemBounds) -> Rect {
        Rect::from_min_size(
            Pos2::new(self.origin.x + b.x, self.origin.y + b.y),
            Vec2::new(b.width, b.height),
        )
    }

    fn draw_bar(&self, item: &DrawItem, rect: Rect) {
        let rounding = Rounding::same(theme::BAR_ROUNDING);

        let shadow = rect.translate(Vec2::new(1.0, 2.0));
        self.painter
            .rect_filled(shadow, rounding, Color32::from_black_alpha(35));

        self.painter.rect_filled(rect, rounding, item.fill);
        let highlight = Rect::from_min_size(
            rect.min,
            Vec2::new(rect.width(), (rect.height() * 0.45).max(4.0)),
        );
        self.painter.rect_filled(
            highlight,
            Rounding {
                nw: theme::BAR_ROUNDING,
                ne: theme::BAR_ROUNDING,
                sw: 0.0,
                se: 0.0,
            },
            Color32::from_white_alpha(25),
        );

        // Priority stripe along the left edge.
        let stripe = Rect::from_min_size(rect.min, Vec2::new(3.0, rect.height()));
        self.painter.rect_filled(
            stripe,
            Rounding {
                nw: theme::BAR_ROUNDING,
                sw: theme::BAR_ROUNDING,
                ne: 0.0,
                se: 0.0,
            },
            item.accent,
        );

        if let Some(progress) = item.progress {
            let progress = progress.clamp(0.0, 1.0);
            if progress > 0.0 {
                let width = rect.width() * progress;
                let overlay = Rect::from_min_size(rect.min, Vec2::new(width, rect.height()));
                self.painter
                    .rect_filled(overlay, rounding, theme::PROGRESS_OVERLAY);
                if progress < 0.98 {
                    let tick_x = rect.left() + width;
                    self.painter.line_segment(
                        [
                            Pos2::new(tick_x, rect.top() + 2.0),
                            Pos2::new(tick_x, rect.bottom() - 2.0),
                        ],
                        Stroke::new(1.0, Color32::from_white_alpha(60)),
                    );
                }
            }
        }

        if item.selected {
            self.painter.rect_stroke(
                rect.expand(1.5),
                Rounding::same(theme::BAR_ROUNDING + 1.5),
                Stroke::new(2.0, theme::BORDER_ACCENT),
            );
        } else if item.hovered {
            self.painter.rect_stroke(
                rect.expand(1.0),
                rounding,
                Stroke::new(1.0, theme::BORDER_ACCENT),
            );
        }

        // Label clipped to the bar so long titles never bleed out.
        if rect.width() > 30.0 {
            let galley =
                self.painter
                    .layout_no_wrap(item.label.clone(), theme::font_bar(), theme::TEXT_ON_BAR);
            let clipped = self.painter.with_clip_rect(rect);
            let text_y = rect.top() + (rect.height() - galley.size().y) / 2.0;
            clipped.galley(
                Pos2::new(rect.left() + 7.0, text_y),
                galley,
                Color32::TRANSPARENT,
            );
        }
    }

    fn draw_diamond(&self, item: &DrawItem, rect: Rect) {
        let center = rect.center();
        let size = (rect.height() / 2.0).max(5.0);

        let shadow_offset = Vec2::new(1.0, 1.5);
        let shadow: Vec<Pos2> = [
            Vec2::new(0.0, -size),
            Vec2::new(size, 0.0),
            Vec2::new(0.0, size),
            Vec2::new(-size, 0.0),
        ]
        .iter()
        .map(|v| center + shadow_offset + *v)
        .collect();
        self.painter.add(egui::Shape::convex_polygon(
            shadow,
            Color32::from_black_alpha(40),
            Stroke::NONE,
        ));

        let points = vec![
            Pos2::new(center.x, center.y - size),
            Pos2::new(center.x + size, center.y),
            Pos2::new(center.x, center.y + size),
            Pos2::new(center.x - size, center.y),
        ];
        self.painter.add(egui::Shape::convex_polygon(
            points.clone(),
            item.fill,
            Stroke::NONE,
        ));
        if item.selected {
            self.painter.add(egui::Shape::convex_polygon(
                points,
                Color32::TRANSPARENT,
                Stroke::new(2.0, theme::BORDER_ACCENT),
            ));
        }

        self.painter.text(
            Pos2::new(center.x + size + 6.0, center.y),
            egui::Align2::LEFT_CENTER,
            &item.label,
            theme::font_bar(),
            theme::TEXT_SECONDARY,
        );
    }
}

impl RenderDriver for EguiDriver<'_> {
    fn draw_lane_background(&mut self, index: usize, bounds: ItemBounds) {
        let bg = if index % 2 == 0 {
            theme::BG_PANEL
        } else {
            theme::BG_DARK
        };
        let rect = self.rect(bounds);
        self.painter.rect_filled(rect, 0.0, bg);
        self.painter.line_segment(
            [rect.left_bottom(), rect.right_bottom()],
            Stroke::new(0.5, theme::BORDER_SUBTLE),
        );
    }

    fn draw_header(&mut self, header: &DrawHeader) {
        let rect = self.rect(header.bounds);
        self.painter.rect_filled(rect, 0.0, theme::BG_HEADER);
        if let Some(accent) = header.accent {
            let stripe = Rect::from_min_size(rect.min, Vec2::new(3.0, rect.height()));
            self.painter.rect_filled(stripe, 0.0, accent);
        }
        let arrow = if header.collapsed { "\u{25B8}" } else { "\u{25BE}" };
        self.painter.text(
            Pos2::new(rect.left() + 8.0, rect.center().y),
            egui::Align2::LEFT_CENTER,
            format!("{arrow} {}", header.label),
            theme::font_header(),
            theme::TEXT_PRIMARY,
        );
        self.painter.text(
            Pos2::new(rect.right() - 8.0, rect.center().y),
            egui::Align2::RIGHT_CENTER,
            format!("{}", header.item_count),
            theme::font_small(),
            theme::TEXT_DIM,
        );
        self.painter.line_segment(
            [rect.left_bottom(), rect.right_bottom()],
            Stroke::new(1.0, theme::BORDER_SUBTLE),
        );
    }

    fn draw_item(&mut self, item: &DrawItem) {
        let rect = self.rect(item.bounds);
        if item.instantaneous {
            self.draw_diamond(item, rect);
        } else {
            self.draw_bar(item, rect);
        }
    }

    fn draw_time_tick(&mut self, x: f32, label: Option<&str>, major: bool) {
        let x = self.origin.x + x;
        let stroke = if major {
            Stroke::new(1.0, theme::BORDER_SUBTLE)
        } else {
            Stroke::new(0.5, theme::GRID_LINE)
        };
        self.painter.line_segment(
            [
                Pos2::new(x, self.origin.y + theme::HEADER_HEIGHT),
                Pos2::new(x, self.origin.y + self.height),
            ],
            stroke,
        );
        if let Some(label) = label {
            self.painter.text(
                Pos2::new(x + 3.0, self.origin.y + theme::HEADER_HEIGHT - 8.0),
                egui::Align2::LEFT_CENTER,
                label,
                theme::font_sub(),
                if major {
                    theme::TEXT_PRIMARY
                } else {
                    theme::TEXT_SECONDARY
                },
            );
        }
    }

    fn draw_marker_line(&mut self, x: f32, label: &str) {
        let x = self.origin.x + x;
        self.painter.line_segment(
            [
                Pos2::new(x, self.origin.y + theme::HEADER_HEIGHT),
                Pos2::new(x, self.origin.y + self.height),
            ],
            Stroke::new(1.5, theme::TODAY_LINE),
        );
        let badge_w = 42.0;
        let badge = Rect::from_min_size(
            Pos2::new(x - badge_w / 2.0, self.origin.y + theme::HEADER_HEIGHT - 1.0),
            Vec2::new(badge_w, 14.0),
        );
        self.painter
            .rect_filled(badge, Rounding::same(3.0), theme::TODAY_LINE);
        self.painter.text(
            badge.center(),
            egui::Align2::CENTER_CENTER,
            label,
            theme::font_small(),
            Color32::WHITE,
        );
    }
}
