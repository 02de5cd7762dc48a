use eframe::egui::{self, FontData, FontDefinitions, FontFamily};
use log::{info, warn};

/// System fonts with Hangul coverage, tried in order.
const HANGUL_FONT_CANDIDATES: &[&str] = &[
    "C:\\Windows\\Fonts\\malgun.ttf",
    "/System/Library/Fonts/AppleSDGothicNeo.ttc",
    "/Library/Fonts/AppleGothic.ttf",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/nanum/NanumGothic.ttf",
];

/// egui's bundled fonts have no Hangul glyphs; add the first system font
/// found as a fallback for both families.
pub fn install_hangul_font(ctx: &egui::Context) {
    let Some((path, bytes)) = HANGUL_FONT_CANDIDATES
        .iter()
        .find_map(|path| std::fs::read(path).ok().map(|bytes| (*path, bytes)))
    else {
        warn!("No Hangul font found; Korean labels may not render");
        return;
    };

    let mut fonts = FontDefinitions::default();
    fonts
        .font_data
        .insert("hangul".to_owned(), FontData::from_owned(bytes).into());
    for family in [FontFamily::Proportional, FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .push("hangul".to_owned());
    }
    ctx.set_fonts(fonts);
    info!("Using {path} for Hangul text");
}
