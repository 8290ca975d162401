use std::sync::Arc;

use tracing::info;
use ytlatest_core::Result;
use ytlatest_extractor::{
    load_cookie_header, AcquisitionStrategy, AudioAcquirer, AuthMethod, MediaRequest, YtDlp,
};
use ytlatest_innertube::InnerTubeClient;
use ytlatest_resolver::{ChromiumConfig, ChromiumDriver, ResolverConfig, VideoResolver};

use crate::config::Settings;

/// Shared, read-only request dependencies.
#[derive(Clone)]
pub struct AppState {
    resolver: VideoResolver,
    acquirer: AudioAcquirer,
}

impl AppState {
    pub const fn new(resolver: VideoResolver, acquirer: AudioAcquirer) -> Self {
        Self { resolver, acquirer }
    }

    /// Wire the production browser driver and the configured acquisition strategy.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let driver = ChromiumDriver::new(ChromiumConfig {
            executable: settings.resolver.chrome_executable.clone(),
            user_agent: settings.resolver.user_agent.clone(),
            headless: settings.resolver.headless,
            ..ChromiumConfig::default()
        });
        let resolver = VideoResolver::new(
            Arc::new(driver),
            ResolverConfig {
                wait_timeout: settings.resolver.wait_timeout(),
                poll_interval: settings.resolver.poll_interval(),
            },
        );

        let audio = &settings.audio;
        let acquirer = match audio.strategy {
            AcquisitionStrategy::StreamRelay => {
                let request = MediaRequest {
                    user_agent: Some(audio.user_agent.clone()),
                    cookie: audio.cookie_file.as_deref().and_then(load_cookie_header),
                    ..MediaRequest::default()
                };
                AudioAcquirer::stream_relay(
                    Arc::new(InnerTubeClient::new()?),
                    request,
                    audio.format_policy,
                )
            }
            AcquisitionStrategy::ExternalTool => {
                let mut ytdlp = YtDlp::new(&audio.ytdlp_path)
                    .with_timeout(audio.process_timeout())
                    .with_auth_method(
                        audio
                            .cookies_from_browser
                            .clone()
                            .map_or(AuthMethod::None, AuthMethod::BrowserCookies),
                    );
                if let Some(root) = &audio.temp_root {
                    ytdlp = ytdlp.with_temp_root(root);
                }
                AudioAcquirer::external_tool(ytdlp)
            }
        };
        info!("Audio strategy: {:?}", acquirer.strategy());

        Ok(Self::new(resolver, acquirer))
    }

    pub const fn resolver(&self) -> &VideoResolver {
        &self.resolver
    }

    pub const fn acquirer(&self) -> &AudioAcquirer {
        &self.acquirer
    }
}
