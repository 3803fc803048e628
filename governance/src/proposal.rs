//! Governance proposals.
//!
//! The on-chain tx only commits to a payload digest; the payload itself
//! (name, link, requested amounts, ...) reaches the store through the
//! gossip boundary and is joined to its tx by id.

use crate::params::Param;
use agora_types::{TxId, TxType};
use serde::{Deserialize, Serialize};

/// Fields shared by every proposal kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCommon {
    pub name: String,
    pub title: String,
    pub description: String,
    pub link: String,
    /// The confirmed tx that burnt the proposal fee.
    pub tx_id: TxId,
    pub cycle_index: u32,
}

/// A governance proposal, variant per intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Proposal {
    /// Request issuance of new colored units as contributor compensation.
    Compensation {
        common: ProposalCommon,
        requested_amount: u64,
        address: String,
    },
    /// Change one governance parameter.
    ChangeParam {
        common: ProposalCommon,
        param: Param,
        new_value: i64,
    },
    /// Burn a misbehaving role-holder's bond.
    BurnBond {
        common: ProposalCommon,
        bond_id: String,
    },
    /// De-list a traded asset.
    RemoveAsset {
        common: ProposalCommon,
        asset_ticker: String,
    },
    /// A binding poll with no on-chain effect.
    Generic { common: ProposalCommon },
}

impl Proposal {
    pub fn common(&self) -> &ProposalCommon {
        match self {
            Proposal::Compensation { common, .. }
            | Proposal::ChangeParam { common, .. }
            | Proposal::BurnBond { common, .. }
            | Proposal::RemoveAsset { common, .. }
            | Proposal::Generic { common } => common,
        }
    }

    pub fn tx_id(&self) -> TxId {
        self.common().tx_id
    }

    pub fn cycle_index(&self) -> u32 {
        self.common().cycle_index
    }

    /// The tx classification the proposal's on-chain tx must carry.
    pub fn expected_tx_type(&self) -> TxType {
        match self {
            Proposal::Compensation { .. } => TxType::CompensationRequest,
            Proposal::RemoveAsset { .. } => TxType::AssetRemoval,
            Proposal::ChangeParam { .. } | Proposal::BurnBond { .. } | Proposal::Generic { .. } => {
                TxType::Proposal
            }
        }
    }

    /// Quorum parameter for this proposal kind, in stake units.
    pub fn quorum_param(&self) -> Param {
        match self {
            Proposal::Compensation { .. } => Param::QuorumCompRequest,
            Proposal::ChangeParam { .. } => Param::QuorumChangeParam,
            Proposal::RemoveAsset { .. } => Param::QuorumRemoveAsset,
            Proposal::BurnBond { .. } | Proposal::Generic { .. } => Param::QuorumProposal,
        }
    }

    /// Threshold parameter for this proposal kind, in basis points.
    pub fn threshold_param(&self) -> Param {
        match self {
            Proposal::Compensation { .. } => Param::ThresholdCompRequest,
            Proposal::ChangeParam { .. } => Param::ThresholdChangeParam,
            Proposal::RemoveAsset { .. } => Param::ThresholdRemoveAsset,
            Proposal::BurnBond { .. } | Proposal::Generic { .. } => Param::ThresholdProposal,
        }
    }

    /// Syntactic validation, independent of chain state.
    pub fn validate(&self) -> Result<(), String> {
        let common = self.common();
        if common.name.trim().is_empty() {
            return Err("proposal name must not be empty".into());
        }
        if common.link.trim().is_empty() {
            return Err("proposal link must not be empty".into());
        }
        match self {
            Proposal::Compensation {
                requested_amount,
                address,
                ..
            } => {
                if *requested_amount == 0 {
                    return Err("requested amount must be positive".into());
                }
                if address.trim().is_empty() {
                    return Err("issuance address must not be empty".into());
                }
            }
            Proposal::ChangeParam {
                param, new_value, ..
            } => {
                if *param == Param::Undefined {
                    return Err("cannot govern the UNDEFINED parameter".into());
                }
                if *new_value < 0 {
                    return Err("parameter values must not be negative".into());
                }
            }
            Proposal::BurnBond { bond_id, .. } => {
                if bond_id.trim().is_empty() {
                    return Err("bond id must not be empty".into());
                }
            }
            Proposal::RemoveAsset { asset_ticker, .. } => {
                if asset_ticker.trim().is_empty() {
                    return Err("asset ticker must not be empty".into());
                }
            }
            Proposal::Generic { .. } => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn common(name: &str) -> ProposalCommon {
        ProposalCommon {
            name: name.into(),
            title: "Title".into(),
            description: "Description".into(),
            link: "https://forum.example/p/1".into(),
            tx_id: TxId::new([7u8; 32]),
            cycle_index: 3,
        }
    }

    #[test]
    fn change_param_maps_to_its_quorum_and_threshold() {
        let proposal = Proposal::ChangeParam {
            common: common("fee-change"),
            param: Param::ProposalFee,
            new_value: 150,
        };
        assert_eq!(proposal.quorum_param(), Param::QuorumChangeParam);
        assert_eq!(proposal.threshold_param(), Param::ThresholdChangeParam);
        assert_eq!(proposal.expected_tx_type(), TxType::Proposal);
        assert!(proposal.validate().is_ok());
    }

    #[test]
    fn compensation_maps_to_comp_request() {
        let proposal = Proposal::Compensation {
            common: common("pay-me"),
            requested_amount: 500,
            address: "addr".into(),
        };
        assert_eq!(proposal.expected_tx_type(), TxType::CompensationRequest);
        assert_eq!(proposal.quorum_param(), Param::QuorumCompRequest);
    }

    #[test]
    fn empty_name_rejected() {
        let proposal = Proposal::Generic { common: common("  ") };
        assert!(proposal.validate().is_err());
    }

    #[test]
    fn zero_compensation_rejected() {
        let proposal = Proposal::Compensation {
            common: common("p"),
            requested_amount: 0,
            address: "addr".into(),
        };
        assert!(proposal.validate().is_err());
    }

    #[test]
    fn undefined_param_rejected() {
        let proposal = Proposal::ChangeParam {
            common: common("p"),
            param: Param::Undefined,
            new_value: 1,
        };
        assert!(proposal.validate().is_err());
    }
}
