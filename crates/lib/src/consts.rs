pub const APP_NAME: &str = "ptpack";

/// Length of the truncated hash used for store directory names.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Default descriptor file name, looked up in the working directory.
pub const DESCRIPTOR_FILENAME: &str = "ptpack.toml";

/// January 1, 1980 00:00:00 UTC. Fed to builds as `SOURCE_DATE_EPOCH`.
pub const SOURCE_DATE_EPOCH: &str = "315532800";

/// Path prefix the source tree is remapped to inside compiled artifacts.
pub const REMAPPED_SOURCE_PREFIX: &str = "/build/source";
