//! Tool Registry
//!
//! Static catalog of every motif-finding engine the pipeline understands.
//! The order of [`REGISTRY`] is the probing order and therefore the order of
//! `available_tools` and `tools` in the written configuration.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Supported motif-finding engines, in registry order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
pub enum Engine {
    #[strum(serialize = "MDmodule")]
    MdModule,
    #[strum(serialize = "MEME")]
    Meme,
    #[strum(serialize = "Weeder")]
    Weeder,
    #[strum(serialize = "GADEM")]
    Gadem,
    #[strum(serialize = "MotifSampler")]
    MotifSampler,
    #[strum(serialize = "trawler")]
    Trawler,
    #[strum(serialize = "Improbizer")]
    Improbizer,
    #[strum(serialize = "BioProspector")]
    BioProspector,
    #[strum(serialize = "Posmo")]
    Posmo,
    #[strum(serialize = "ChIPMunk")]
    ChIPMunk,
    #[strum(serialize = "JASPAR")]
    Jaspar,
    #[strum(serialize = "AMD")]
    Amd,
    #[strum(serialize = "HMS")]
    Hms,
    #[strum(serialize = "Homer")]
    Homer,
}

impl Engine {
    /// Descriptor for this engine.
    pub fn spec(self) -> &'static ToolSpec {
        REGISTRY
            .iter()
            .find(|spec| spec.engine == Some(self))
            .unwrap_or_else(|| unreachable!("engine {self} missing from registry"))
    }
}

/// How an engine is invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// A command token resolved against the staging tree and then `$PATH`.
    Command {
        token: &'static str,
        overrides: Option<SearchOverride>,
    },
    /// A pseudo-engine backed by a motif database; recorded with a fixed
    /// path and never looked up.
    Fixed(&'static str),
}

/// Alternate tokens for engines whose staged layout differs from their
/// installed name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOverride {
    /// Path relative to the staging root.
    pub staged: &'static str,
    /// Token searched for on the executable search path.
    pub system: &'static str,
}

/// Rule deriving an engine's working directory from its binary path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirRule {
    /// Strip the trailing path segment.
    Parent,
    /// Strip the first suffix the binary path ends with (component-wise),
    /// falling back to [`DirRule::Parent`].
    StripSuffix(&'static [&'static str]),
    /// No working directory is recorded.
    None,
}

/// Immutable descriptor of one supported engine (or the rendering helper).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    /// Registry identity; `None` for helpers outside the engine catalog.
    pub engine: Option<Engine>,
    /// Stable name used as the configuration key.
    pub name: &'static str,
    pub invocation: Invocation,
    pub dir_rule: DirRule,
    /// Excluded from the default-enabled subset even when available.
    pub long_running: bool,
    /// A compiled copy is expected in the source tree.
    pub bundled: bool,
}

impl ToolSpec {
    const fn command(engine: Engine, name: &'static str, token: &'static str) -> Self {
        Self {
            engine: Some(engine),
            name,
            invocation: Invocation::Command {
                token,
                overrides: None,
            },
            dir_rule: DirRule::Parent,
            long_running: false,
            bundled: false,
        }
    }

    const fn staged_as(mut self, staged: &'static str) -> Self {
        if let Invocation::Command { token, .. } = self.invocation {
            self.invocation = Invocation::Command {
                token,
                overrides: Some(SearchOverride {
                    staged,
                    system: token,
                }),
            };
        }
        self
    }

    const fn dir_rule(mut self, rule: DirRule) -> Self {
        self.dir_rule = rule;
        self
    }

    const fn bundled(mut self) -> Self {
        self.bundled = true;
        self
    }

    const fn long_running(mut self) -> Self {
        self.long_running = true;
        self
    }

    /// Canonical invocation token (the fixed path for database pseudo-engines).
    pub fn token(&self) -> &'static str {
        match self.invocation {
            Invocation::Command { token, .. } => token,
            Invocation::Fixed(path) => path,
        }
    }

    /// Path searched for under the staging root.
    pub fn staging_candidate(&self) -> &'static str {
        match self.invocation {
            Invocation::Command {
                overrides: Some(o), ..
            } => o.staged,
            _ => self.token(),
        }
    }

    /// Token searched for on the executable search path.
    pub fn system_token(&self) -> &'static str {
        match self.invocation {
            Invocation::Command {
                overrides: Some(o), ..
            } => o.system,
            _ => self.token(),
        }
    }
}

/// Every engine, in probing order.
pub const REGISTRY: &[ToolSpec] = &[
    ToolSpec::command(Engine::MdModule, "MDmodule", "MDmodule").bundled(),
    ToolSpec::command(Engine::Meme, "MEME", "meme.bin")
        .dir_rule(DirRule::StripSuffix(&["bin/meme.bin", "meme.bin"]))
        .bundled(),
    ToolSpec::command(Engine::Weeder, "Weeder", "weederTFBS.out")
        .dir_rule(DirRule::StripSuffix(&["weederTFBS.out"])),
    ToolSpec::command(Engine::Gadem, "GADEM", "gadem")
        .bundled()
        .long_running(),
    ToolSpec::command(Engine::MotifSampler, "MotifSampler", "MotifSampler"),
    ToolSpec::command(Engine::Trawler, "trawler", "trawler.pl")
        .staged_as("trawler/bin/trawler.pl")
        .dir_rule(DirRule::StripSuffix(&["bin/trawler.pl"])),
    ToolSpec::command(Engine::Improbizer, "Improbizer", "ameme"),
    ToolSpec::command(Engine::BioProspector, "BioProspector", "BioProspector").bundled(),
    ToolSpec::command(Engine::Posmo, "Posmo", "posmo").bundled(),
    ToolSpec::command(Engine::ChIPMunk, "ChIPMunk", "ChIPMunk.sh")
        .staged_as("ChIPMunk/ChIPMunk.sh")
        .dir_rule(DirRule::StripSuffix(&["ChIPMunk.sh"])),
    ToolSpec {
        engine: Some(Engine::Jaspar),
        name: "JASPAR",
        invocation: Invocation::Fixed("/bin/false"),
        dir_rule: DirRule::None,
        long_running: false,
        bundled: false,
    },
    ToolSpec::command(Engine::Amd, "AMD", "AMD.bin").bundled(),
    ToolSpec::command(Engine::Hms, "HMS", "hms").staged_as("HMS/hms"),
    ToolSpec::command(Engine::Homer, "Homer", "homer2").bundled(),
];

/// Sequence-logo rendering helper; located like an engine but recorded
/// separately.
pub const SEQLOGO: ToolSpec = ToolSpec {
    engine: None,
    name: "seqlogo",
    invocation: Invocation::Command {
        token: "seqlogo",
        overrides: None,
    },
    dir_rule: DirRule::None,
    long_running: false,
    bundled: true,
};

/// All engine descriptors in registry order.
pub fn list() -> &'static [ToolSpec] {
    REGISTRY
}

/// Engines in registry order.
pub fn engines() -> impl Iterator<Item = Engine> {
    Engine::iter()
}
