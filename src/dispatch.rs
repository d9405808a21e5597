use color_eyre::eyre::{
    Result,
    WrapErr,
};
use tracing::{
    debug,
    info,
    warn,
};
use url::Url;

const AUTOPLAY_PARAMS: [(&str, &str); 3] =
    [("autoplay", "1"), ("controls", "0"), ("modestbranding", "1")];

/// The two fixed external locations the game can send a visitor to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Targets {
    pub destination: Url,
    pub distraction: Url,
}

impl Targets {
    pub fn new(destination: Url, distraction: Url) -> Self {
        Self {
            destination,
            distraction,
        }
    }

    /// Distraction URL with autoplay on and player chrome off. Parameters the
    /// configured URL already carries are left alone.
    pub fn distraction_url(&self) -> Url {
        let mut url = self.distraction.clone();
        let present: Vec<String> = url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in AUTOPLAY_PARAMS {
                if !present.iter().any(|existing| existing == key) {
                    pairs.append_pair(key, value);
                }
            }
        }
        url
    }

    pub fn destination_host(&self) -> &str {
        self.destination
            .host_str()
            .unwrap_or(self.destination.as_str())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WindowRequest {
    pub url: Url,
    pub fullscreen: bool,
    /// Viewport in the front end's own units (terminal cells).
    pub viewport: Option<(u16, u16)>,
}

/// Opens things outside the process.
pub trait Launcher {
    /// Replace the current browsing context with `url`.
    fn navigate(&mut self, url: &Url) -> Result<()>;

    fn open_window(&mut self, request: &WindowRequest) -> Result<()>;
}

/// Hands URLs to the platform's default handler.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn navigate(&mut self, url: &Url) -> Result<()> {
        open::that_detached(url.as_str()).wrap_err_with(|| format!("open {url}"))
    }

    fn open_window(&mut self, request: &WindowRequest) -> Result<()> {
        // the platform opener has no say over window geometry
        debug!(viewport = ?request.viewport, fullscreen = request.fullscreen, "window geometry ignored");
        open::that_detached(request.url.as_str())
            .wrap_err_with(|| format!("open window at {}", request.url))
    }
}

/// Fire-and-forget side effects. Failures are logged and otherwise dropped:
/// there is no retry and nothing is reported to the visitor.
#[derive(Clone, Debug)]
pub struct OutcomeDispatcher<L> {
    launcher: L,
    targets: Targets,
}

impl<L: Launcher> OutcomeDispatcher<L> {
    pub fn new(launcher: L, targets: Targets) -> Self {
        Self { launcher, targets }
    }

    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    pub fn redirect(&mut self) {
        let url = &self.targets.destination;
        match self.launcher.navigate(url) {
            Ok(()) => info!(%url, "redirected to destination"),
            Err(err) => warn!(%url, error = %err, "redirect failed"),
        }
    }

    pub fn launch_distraction(&mut self, viewport: Option<(u16, u16)>) {
        let request = WindowRequest {
            url: self.targets.distraction_url(),
            fullscreen: true,
            viewport,
        };
        match self.launcher.open_window(&request) {
            Ok(()) => info!(url = %request.url, "distraction opened"),
            Err(err) => warn!(url = %request.url, error = %err, "distraction window blocked"),
        }
    }
}
