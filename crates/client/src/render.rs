use thiserror::Error;

use voidrun::World;

/// Plugin seam for the presentation layer. The core protocol knows nothing
/// about rendering; graphical backends are external modules resolved by
/// name at startup.
pub trait Renderer {
    fn name(&self) -> &'static str;
    fn render(&mut self, world: &World);
}

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("renderer module '{0}' is not linked into this build")]
    Unavailable(String),
    #[error("unknown renderer '{0}'")]
    Unknown(String),
}

/// Console renderer: reports the replicated entity count about once a
/// second at the client frame rate.
pub struct HeadlessRenderer {
    frames: u32,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self { frames: 0 }
    }
}

impl Renderer for HeadlessRenderer {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn render(&mut self, world: &World) {
        self.frames = self.frames.wrapping_add(1);
        if self.frames % 60 == 0 {
            log::info!("{} replicated entities", world.entity_count());
        }
    }
}

pub fn resolve_renderer(name: &str) -> Result<Box<dyn Renderer>, RendererError> {
    match name {
        "headless" => Ok(Box::new(HeadlessRenderer::new())),
        "sdl2" | "sfml" => Err(RendererError::Unavailable(name.to_owned())),
        other => Err(RendererError::Unknown(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_resolves() {
        let renderer = resolve_renderer("headless").unwrap();
        assert_eq!(renderer.name(), "headless");
    }

    #[test]
    fn graphical_backends_are_external() {
        assert!(matches!(
            resolve_renderer("sdl2"),
            Err(RendererError::Unavailable(_))
        ));
        assert!(matches!(
            resolve_renderer("sfml"),
            Err(RendererError::Unavailable(_))
        ));
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(matches!(
            resolve_renderer("vulkan"),
            Err(RendererError::Unknown(_))
        ));
    }
}
