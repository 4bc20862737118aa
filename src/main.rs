//! Scroll stack entry point
//!
//! On the web this mounts every `[data-scroll-stack]` container on the page.
//! Natively it logs a walk through a sample stack.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use wasm_bindgen::JsCast;
    use web_sys::HtmlElement;

    use scroll_stack::Settings;
    use scroll_stack::consts::CONFIG_ATTRIBUTE;
    use scroll_stack::platform::PlatformError;
    use scroll_stack::platform::motion::effective_reduced_motion;
    use scroll_stack::platform::mount::StackMount;
    use scroll_stack::stack::StackConfig;

    thread_local! {
        static MOUNTS: RefCell<Vec<StackMount>> = const { RefCell::new(Vec::new()) };
    }

    /// Read the container's configuration attribute, defaulting on bad input
    fn config_for(root: &HtmlElement) -> StackConfig {
        match root.get_attribute(CONFIG_ATTRIBUTE) {
            Some(json) if !json.trim().is_empty() => StackConfig::from_json(&json)
                .unwrap_or_else(|e| {
                    log::warn!("Ignoring invalid {CONFIG_ATTRIBUTE}: {e}");
                    StackConfig::default()
                }),
            _ => StackConfig::default(),
        }
    }

    pub fn start() -> Result<(), PlatformError> {
        console_error_panic_hook::set_once();
        let settings = Settings::load();
        let _ = console_log::init_with_level(settings.log_level());

        let document = web_sys::window()
            .ok_or(PlatformError::NoWindow)?
            .document()
            .ok_or(PlatformError::NoDocument)?;
        let reduced_motion = effective_reduced_motion(&settings);

        let roots = document.query_selector_all(&format!("[{CONFIG_ATTRIBUTE}]"))?;
        let mut mounted = Vec::new();
        for i in 0..roots.length() {
            let Some(root) = roots.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) else {
                continue;
            };
            let config = config_for(&root);
            match StackMount::mount(root, config, reduced_motion, None) {
                Ok(mount) => mounted.push(mount),
                Err(e) => log::error!("Failed to mount scroll stack: {e}"),
            }
        }

        log::info!("Mounted {} scroll stack(s)", mounted.len());
        MOUNTS.with(|m| m.borrow_mut().extend(mounted));
        Ok(())
    }

    pub fn unmount_all() {
        let mounts = MOUNTS.with(|m| std::mem::take(&mut *m.borrow_mut()));
        for mut mount in mounts {
            mount.unmount();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = web::start() {
        log::error!("Scroll stack startup failed: {e}");
    }
}

/// Tear down every mounted stack (page transitions)
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn unmount_all() {
    web::unmount_all();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Scroll stack (native) starting...");
    log::info!("Native mode only walks a sample stack - serve the wasm build for the web version");

    walk_sample_stack();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
struct SampleLayout;

#[cfg(not(target_arch = "wasm32"))]
impl scroll_stack::stack::LayoutProbe for SampleLayout {
    fn card_offsets(&self) -> Vec<f64> {
        vec![1000.0, 1500.0, 2000.0]
    }

    fn end_marker_offset(&self) -> Option<f64> {
        Some(3000.0)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn walk_sample_stack() {
    use scroll_stack::stack::{Geometry, compute_frame};
    use scroll_stack::{ScrollSnapshot, StackConfig};

    let config = StackConfig::default();
    let geometry = Geometry::measure(&SampleLayout);
    let viewport_height = 1000.0;

    for scroll_top in (0..=3200).step_by(400) {
        let snapshot = ScrollSnapshot::new(scroll_top as f64, viewport_height);
        for frame in compute_frame(snapshot, &geometry, &config) {
            log::info!(
                "scroll {:>5} card {} {:?} p={:.3} {} {}",
                scroll_top,
                frame.index,
                frame.phase,
                frame.progress,
                frame.state.css_transform(),
                frame.state.css_filter()
            );
        }
    }
}
