//! Protocol version constants and the predicate helpers that localize every
//! version-dependent branch in the message codecs.

/// The set of native-protocol variants this crate speaks.
///
/// Ordered so that `>=`/`<` comparisons between variants read naturally: the
/// open-protocol versions order by their numeric value, and each DSE variant
/// sits above the open-protocol version it is based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolVersion {
    V3,
    V4,
    V5Beta,
    DseV1,
    DseV2,
}

impl ProtocolVersion {
    /// Every supported version, in ascending order.
    pub const ALL: [ProtocolVersion; 5] = [
        ProtocolVersion::V3,
        ProtocolVersion::V4,
        ProtocolVersion::V5Beta,
        ProtocolVersion::DseV1,
        ProtocolVersion::DseV2,
    ];

    pub fn iter_all() -> impl Iterator<Item = ProtocolVersion> {
        Self::ALL.into_iter()
    }

    pub fn is_beta(self) -> bool {
        matches!(self, ProtocolVersion::V5Beta)
    }

    pub fn is_dse(self) -> bool {
        matches!(self, ProtocolVersion::DseV1 | ProtocolVersion::DseV2)
    }

    /// `true` for every version the open CQL protocol considers "v5 or
    /// later" (v5 beta and both DSE variants, which are layered on top of
    /// v5-era framing).
    fn is_v5_or_later(self) -> bool {
        matches!(
            self,
            ProtocolVersion::V5Beta | ProtocolVersion::DseV1 | ProtocolVersion::DseV2
        )
    }

    /// `true` for v4 and everything after it.
    fn is_v4_or_later(self) -> bool {
        self != ProtocolVersion::V3
    }

    /// Width, in bytes, of the QUERY/EXECUTE/BATCH flag word: `byte` on
    /// v3/v4, `int` on v5+.
    pub fn query_flags_width(self) -> usize {
        if self.is_v5_or_later() {
            4
        } else {
            1
        }
    }

    /// `Unset` bound-value tag, `WITH_NAMES_FOR_VALUES`-style named values,
    /// and pk-indices in `VariablesMetadata` are all v4+.
    pub fn supports_named_values(self) -> bool {
        self.is_v4_or_later()
    }

    pub fn supports_unset_values(self) -> bool {
        self.is_v4_or_later()
    }

    pub fn supports_pk_indices(self) -> bool {
        self.is_v4_or_later()
    }

    pub fn supports_result_metadata_id(self) -> bool {
        self.is_v5_or_later()
    }

    pub fn supports_with_keyspace(self) -> bool {
        self.is_v5_or_later()
    }

    pub fn supports_now_in_seconds(self) -> bool {
        self.is_v5_or_later()
    }

    pub fn supports_duration_type(self) -> bool {
        self.is_v5_or_later()
    }

    pub fn supports_function_schema_change(self) -> bool {
        self.is_v4_or_later()
    }

    pub fn supports_failure_reason_map(self) -> bool {
        self.is_v5_or_later()
    }

    pub fn supports_continuous_paging(self) -> bool {
        self.is_dse()
    }

    pub fn supports_prepare_flags(self) -> bool {
        self.is_v5_or_later()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_as_expected() {
        assert!(ProtocolVersion::V3 < ProtocolVersion::V4);
        assert!(ProtocolVersion::V4 < ProtocolVersion::V5Beta);
        assert!(ProtocolVersion::V5Beta < ProtocolVersion::DseV1);
        assert!(ProtocolVersion::DseV1 < ProtocolVersion::DseV2);
    }

    #[test]
    fn flag_widths() {
        assert_eq!(ProtocolVersion::V3.query_flags_width(), 1);
        assert_eq!(ProtocolVersion::V4.query_flags_width(), 1);
        assert_eq!(ProtocolVersion::V5Beta.query_flags_width(), 4);
        assert_eq!(ProtocolVersion::DseV1.query_flags_width(), 4);
        assert_eq!(ProtocolVersion::DseV2.query_flags_width(), 4);
    }

    #[test]
    fn iterates_all_versions() {
        assert_eq!(ProtocolVersion::iter_all().count(), 5);
    }
}
