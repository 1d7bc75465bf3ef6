//! Method manifests for the contracts the client binds.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ClientError, ClientResult};
use crate::signer::SignerAuthority;
use crate::validation::InputValidator;

const PROFILE_SERVICE_VIEW: &[&str] = &[
    "is_username_available",
    "has_registered",
    "profile_by_id",
    "post_details",
    "get_all_posts",
    "get_user_ids",
    "repost_details",
    "get_all_repost",
];
const PROFILE_SERVICE_CHANGE: &[&str] = &[
    "mint_profile",
    "edit_profile",
    "mint_post",
    "comment",
    "charge",
    "charge_repost",
];

const PROFILE_USER_VIEW: &[&str] = &[
    "is_username_available",
    "has_registered",
    "profile_by_id",
    "post_details",
    "nft_tokens",
    "get_all_posts",
    "get_user_ids",
    "repost_details",
    "get_all_repost",
];
const PROFILE_USER_CHANGE: &[&str] = &[
    "mint_post",
    "repost",
    "swap",
    "list_post_for_sale",
    "transfer_ownership",
    "buy_post",
];

const TOKEN_VIEW: &[&str] = &["ft_balance_of", "get_owner", "ft_total_supply", "ft_metadata"];
const TOKEN_CHANGE: &[&str] = &[
    "claim_gift",
    "reward_users_for_anniversaries",
    "change_owner_to",
    "ft_transfer",
    "ft_transfer_call",
    "send_aex",
];

const EXCHANGE_VIEW: &[&str] = &["all_pools", "get_user_share"];
const EXCHANGE_CHANGE: &[&str] = &["connect_or_get_balance", "create_pool", "lend", "swap_aex"];

/// The four contract bindings a session carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContractKind {
    /// Fungible token, signed by the user.
    Token,
    /// Liquidity pools and swaps, signed by the user.
    Exchange,
    /// Profile NFT contract where the user signs and pays.
    ProfileUser,
    /// Profile NFT contract signed by the service key; the service pays.
    ProfileService,
}

impl ContractKind {
    pub const ALL: [ContractKind; 4] = [
        ContractKind::Token,
        ContractKind::Exchange,
        ContractKind::ProfileUser,
        ContractKind::ProfileService,
    ];

    pub fn authority(self) -> SignerAuthority {
        match self {
            ContractKind::ProfileService => SignerAuthority::Service,
            _ => SignerAuthority::Wallet,
        }
    }

    pub fn manifest(self) -> MethodManifest {
        let (view, change) = match self {
            ContractKind::Token => (TOKEN_VIEW, TOKEN_CHANGE),
            ContractKind::Exchange => (EXCHANGE_VIEW, EXCHANGE_CHANGE),
            ContractKind::ProfileUser => (PROFILE_USER_VIEW, PROFILE_USER_CHANGE),
            ContractKind::ProfileService => (PROFILE_SERVICE_VIEW, PROFILE_SERVICE_CHANGE),
        };
        MethodManifest::from_static(view, change)
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractKind::Token => "token",
            ContractKind::Exchange => "exchange",
            ContractKind::ProfileUser => "profile (user-signed)",
            ContractKind::ProfileService => "profile (service-signed)",
        };
        f.write_str(name)
    }
}

/// How a contract method may be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Read-only query; no transaction, no gas.
    View,
    /// State-mutating call; signed and paid for.
    Change,
}

/// Disjoint sets of view and change method names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodManifest {
    view_methods: BTreeSet<String>,
    change_methods: BTreeSet<String>,
}

impl MethodManifest {
    pub(crate) fn new<V, C>(view_methods: V, change_methods: C) -> Self
    where
        V: IntoIterator,
        V::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            view_methods: view_methods.into_iter().map(Into::into).collect(),
            change_methods: change_methods.into_iter().map(Into::into).collect(),
        }
    }

    fn from_static(view: &[&str], change: &[&str]) -> Self {
        Self::new(view.iter().copied(), change.iter().copied())
    }

    /// Method names must be valid identifiers and no name may be both view and change.
    pub(crate) fn validate(&self) -> ClientResult<()> {
        let validator = InputValidator::new();
        for method in self.view_methods.iter().chain(self.change_methods.iter()) {
            validator.validate_method_name(method)?;
        }

        if let Some(overlap) = self.view_methods.intersection(&self.change_methods).next() {
            return Err(ClientError::ValidationError(format!(
                "Method '{}' cannot be both a view and a change method",
                overlap
            )));
        }
        Ok(())
    }

    pub fn view_methods(&self) -> &BTreeSet<String> {
        &self.view_methods
    }

    pub fn change_methods(&self) -> &BTreeSet<String> {
        &self.change_methods
    }

    pub fn kind_of(&self, method: &str) -> Option<MethodKind> {
        if self.view_methods.contains(method) {
            Some(MethodKind::View)
        } else if self.change_methods.contains(method) {
            Some(MethodKind::Change)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn service_profile_manifest_is_exact() {
        let manifest = ContractKind::ProfileService.manifest();
        assert_eq!(
            manifest.view_methods(),
            &set(&[
                "is_username_available",
                "has_registered",
                "profile_by_id",
                "post_details",
                "get_all_posts",
                "get_user_ids",
                "repost_details",
                "get_all_repost",
            ])
        );
        assert_eq!(
            manifest.change_methods(),
            &set(&[
                "mint_profile",
                "edit_profile",
                "mint_post",
                "comment",
                "charge",
                "charge_repost",
            ])
        );
    }

    #[test]
    fn user_profile_manifest_is_exact() {
        let manifest = ContractKind::ProfileUser.manifest();
        assert_eq!(
            manifest.view_methods(),
            &set(&[
                "is_username_available",
                "has_registered",
                "profile_by_id",
                "post_details",
                "nft_tokens",
                "get_all_posts",
                "get_user_ids",
                "repost_details",
                "get_all_repost",
            ])
        );
        assert_eq!(
            manifest.change_methods(),
            &set(&[
                "mint_post",
                "repost",
                "swap",
                "list_post_for_sale",
                "transfer_ownership",
                "buy_post",
            ])
        );
    }

    #[test]
    fn token_manifest_is_exact() {
        let manifest = ContractKind::Token.manifest();
        assert_eq!(
            manifest.view_methods(),
            &set(&["ft_balance_of", "get_owner", "ft_total_supply", "ft_metadata"])
        );
        assert_eq!(
            manifest.change_methods(),
            &set(&[
                "claim_gift",
                "reward_users_for_anniversaries",
                "change_owner_to",
                "ft_transfer",
                "ft_transfer_call",
                "send_aex",
            ])
        );
    }

    #[test]
    fn exchange_manifest_is_exact() {
        let manifest = ContractKind::Exchange.manifest();
        assert_eq!(
            manifest.view_methods(),
            &set(&["all_pools", "get_user_share"])
        );
        assert_eq!(
            manifest.change_methods(),
            &set(&["connect_or_get_balance", "create_pool", "lend", "swap_aex"])
        );
    }

    #[test]
    fn only_service_profile_is_service_signed() {
        for kind in ContractKind::ALL {
            let expected = if kind == ContractKind::ProfileService {
                SignerAuthority::Service
            } else {
                SignerAuthority::Wallet
            };
            assert_eq!(kind.authority(), expected, "{kind}");
        }
    }

    #[test]
    fn custom_manifest_rejects_overlap_and_bad_names() {
        assert!(MethodManifest::new(["get"], ["set"]).validate().is_ok());
        assert!(MethodManifest::new(["get"], ["get"]).validate().is_err());
        assert!(MethodManifest::new(["bad name"], Vec::<String>::new())
            .validate()
            .is_err());
        for kind in ContractKind::ALL {
            assert!(kind.manifest().validate().is_ok(), "{kind}");
        }
    }

    #[test]
    fn kind_lookup() {
        let manifest = ContractKind::Exchange.manifest();
        assert_eq!(manifest.kind_of("all_pools"), Some(MethodKind::View));
        assert_eq!(manifest.kind_of("lend"), Some(MethodKind::Change));
        assert_eq!(manifest.kind_of("ft_transfer"), None);
    }
}
