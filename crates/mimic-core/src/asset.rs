//! Asynchronous asset readiness
//!
//! Rigs and clips load asynchronously. Each asset is held in an explicit
//! tagged state that the frame loop checks once per frame; there is no
//! partially-initialized variant.

/// Load state of one asset
#[derive(Debug, Clone)]
pub enum AssetState<T> {
    NotLoaded,
    Loading,
    Ready(T),
}

impl<T> Default for AssetState<T> {
    fn default() -> Self {
        AssetState::NotLoaded
    }
}

impl<T> AssetState<T> {
    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, AssetState::Ready(_))
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        matches!(self, AssetState::Loading)
    }

    /// The loaded asset, if ready
    pub fn ready(&self) -> Option<&T> {
        match self {
            AssetState::Ready(asset) => Some(asset),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            AssetState::Ready(asset) => Some(asset),
            _ => None,
        }
    }

    /// Mark as loading. A ready asset being replaced goes back to loading.
    pub fn begin_loading(&mut self) {
        *self = AssetState::Loading;
    }

    /// Install a fully loaded asset, returning the previous one if any
    pub fn finish(&mut self, asset: T) -> Option<T> {
        match std::mem::replace(self, AssetState::Ready(asset)) {
            AssetState::Ready(previous) => Some(previous),
            _ => None,
        }
    }

    /// Drop the asset
    pub fn unload(&mut self) -> Option<T> {
        match std::mem::take(self) {
            AssetState::Ready(previous) => Some(previous),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AssetState::NotLoaded => "not-loaded",
            AssetState::Loading => "loading",
            AssetState::Ready(_) => "ready",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_lifecycle() {
        let mut state: AssetState<u32> = AssetState::default();
        assert!(!state.is_ready());
        assert!(state.ready().is_none());

        state.begin_loading();
        assert!(state.is_loading());
        assert!(state.ready().is_none());

        assert_eq!(state.finish(7), None);
        assert_eq!(state.ready(), Some(&7));

        assert_eq!(state.finish(8), Some(7));
        assert_eq!(state.unload(), Some(8));
        assert_eq!(state.label(), "not-loaded");
    }
}
