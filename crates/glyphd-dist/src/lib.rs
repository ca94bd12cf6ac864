pub mod archive;
pub mod fetch;
pub mod http;
pub mod layout;
pub mod locate;
pub mod manifest;
pub mod platform;
pub mod publish;
pub mod registry;
pub mod util;

pub use archive::{ArchiveFormat, ExtractError};
pub use fetch::{ArtifactDescriptor, FetchConfig, FetchError, Fetcher, InstalledBinary};
pub use http::{HttpClient, HttpError};
pub use layout::Layout;
pub use locate::{LocateError, Locator};
pub use manifest::{sync_versions, ManifestError, PackageManifest, SyncReport};
pub use platform::{
    resolve, spec_for, supported_list, Arch, Os, PlatformKey, PlatformSpec, UnsupportedPlatform,
    MAIN_PACKAGE, PLATFORMS,
};
pub use publish::{
    PublishOptions, PublishOutcome, PublishPipeline, PublishResult, PublishSummary,
};
pub use registry::{Clock, NpmRegistry, PublishError, Registry, SystemClock};
