//! Target ABI families and their toolchain candidates.
//!
//! The NDK names architectures by ABI string (`arm64-v8a`, `armeabi-v7a`,
//! `x86_64`, ...) and installs one versioned toolchain directory per
//! architecture family. Matching is by case-sensitive prefix against an
//! ordered table: the 64-bit families are listed before their 32-bit
//! namesakes because `arm` is a prefix of `arm64-v8a` and `x86` of `x86_64`.

use std::fmt;

/// All ABI names the build accepts, in the NDK's canonical order.
pub const NDK_ARCHITECTURES: &[&str] = &[
    "arm64-v8a",
    "armeabi",
    "armeabi-v7a",
    "mips",
    "mips64",
    "x86",
    "x86_64",
];

/// ARM toolchain candidates, most preferred first.
const ARM_TOOLCHAINS: &[&str] = &[
    "arm-linux-androideabi-4.9",
    "arm-linux-androideabi-4.8",
    "arm-linux-androideabi-4.7",
    "arm-linux-androideabi-4.6",
    "arm-linux-androideabi-4.4.3",
    "arm-linux-androidabi-clang3.5",
    "arm-linux-androidabi-clang3.6",
];

/// ARM 64-bit toolchain candidates.
const ARM64_TOOLCHAINS: &[&str] = &[
    "aarch64-linux-android-4.9",
    "aarch64-linux-android-clang3.5",
    "aarch64-linux-android-clang3.6",
];

/// x86 toolchain candidates.
const X86_TOOLCHAINS: &[&str] = &[
    "x86-4.9",
    "x86-4.8",
    "x86-4.7",
    "x86-4.6",
    "x86-4.4.3",
    "x86-clang3.5",
    "x86-clang3.6",
];

/// x86 64-bit toolchain candidates.
const X86_64_TOOLCHAINS: &[&str] = &["x86_64-4.9", "x86_64-clang3.5", "x86_64-clang3.6"];

/// MIPS toolchain candidates.
const MIPS_TOOLCHAINS: &[&str] = &[
    "mipsel-linux-android-4.9",
    "mipsel-linux-android-4.8",
    "mipsel-linux-android-4.7",
    "mipsel-linux-android-4.6",
    "mipsel-linux-android-4.4.3",
    "mipsel-linux-android-clang3.5",
    "mipsel-linux-android-clang3.6",
];

/// MIPS 64-bit toolchain candidates.
const MIPS64_TOOLCHAINS: &[&str] = &[
    "mips64el-linux-android-4.9",
    "mips64el-linux-android-clang3.5",
    "mips64el-linux-android-clang3.6",
];

/// One architecture family: the ABI prefix it claims, the toolchains the
/// NDK may ship for it, and the debugger's own ABI folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbiFamily {
    /// Case-sensitive prefix matched against the requested ABI string.
    pub prefix: &'static str,
    /// Short family tag, also the key used by toolchain mappings.
    pub name: &'static str,
    /// Toolchain directory candidates, most preferred first.
    pub toolchains: &'static [&'static str],
    /// Folder name used for the prebuilt debug server.
    pub debug_server_tag: &'static str,
}

/// The family dispatch table. Order is the match order: every 64-bit family
/// precedes the 32-bit family whose name is its prefix.
pub const ABI_FAMILIES: &[AbiFamily] = &[
    AbiFamily {
        prefix: "arm64-v8a",
        name: "arm64",
        toolchains: ARM64_TOOLCHAINS,
        debug_server_tag: "android-arm64",
    },
    AbiFamily {
        prefix: "arm",
        name: "armeabi",
        toolchains: ARM_TOOLCHAINS,
        debug_server_tag: "android-arm",
    },
    AbiFamily {
        prefix: "x86_64",
        name: "x86_64",
        toolchains: X86_64_TOOLCHAINS,
        debug_server_tag: "android-x86_64",
    },
    AbiFamily {
        prefix: "x86",
        name: "x86",
        toolchains: X86_TOOLCHAINS,
        debug_server_tag: "android-x86",
    },
    AbiFamily {
        prefix: "mips64",
        name: "mips64",
        toolchains: MIPS64_TOOLCHAINS,
        debug_server_tag: "android-mips64",
    },
    AbiFamily {
        prefix: "mips",
        name: "mips",
        toolchains: MIPS_TOOLCHAINS,
        debug_server_tag: "android-mips",
    },
];

impl AbiFamily {
    /// Find the family claiming an ABI string, first prefix match wins.
    pub fn for_architecture(architecture: &str) -> Option<&'static AbiFamily> {
        ABI_FAMILIES
            .iter()
            .find(|family| architecture.starts_with(family.prefix))
    }
}

impl fmt::Display for AbiFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Split a space-separated architecture list, dropping empty fields.
pub fn parse_architectures(list: &str) -> Vec<String> {
    list.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sixty_four_bit_families_win_over_prefix_namesakes() {
        assert_eq!(AbiFamily::for_architecture("arm64-v8a").unwrap().name, "arm64");
        assert_eq!(AbiFamily::for_architecture("x86_64").unwrap().name, "x86_64");
        assert_eq!(AbiFamily::for_architecture("mips64").unwrap().name, "mips64");
    }

    #[test]
    fn test_thirty_two_bit_families_still_match() {
        assert_eq!(AbiFamily::for_architecture("armeabi").unwrap().name, "armeabi");
        assert_eq!(
            AbiFamily::for_architecture("armeabi-v7a").unwrap().name,
            "armeabi"
        );
        assert_eq!(AbiFamily::for_architecture("x86").unwrap().name, "x86");
        assert_eq!(AbiFamily::for_architecture("mips").unwrap().name, "mips");
    }

    #[test]
    fn test_unknown_architecture_has_no_family() {
        assert!(AbiFamily::for_architecture("riscv64").is_none());
    }

    #[test]
    fn test_every_table_entry_precedes_its_prefixes() {
        // A family must never be shadowed by an earlier entry whose prefix
        // is a proper prefix of its own.
        for (i, family) in ABI_FAMILIES.iter().enumerate() {
            for earlier in &ABI_FAMILIES[..i] {
                assert!(
                    !family.prefix.starts_with(earlier.prefix),
                    "{} is unreachable behind {}",
                    family.prefix,
                    earlier.prefix
                );
            }
        }
    }

    #[test]
    fn test_parse_architectures() {
        assert_eq!(
            parse_architectures("x86 armeabi  arm64-v8a"),
            vec!["x86", "armeabi", "arm64-v8a"]
        );
        assert!(parse_architectures("  ").is_empty());
    }
}
