//! ABI of the validator registry precompile, limited to the view functions
//! the dashboard reads.

use crate::Result;
use alloy_primitives::Bytes;
use alloy_sol_types::{SolCall, sol};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct Validator {
        bytes32 publicKey;
        string inboundAddress;
        string outboundAddress;
        bool active;
        address validatorAddress;
        uint64 index;
    }

    interface IValidatorConfig {
        function getValidators() external view returns (Validator[] memory validators);
        function getNextFullDkgCeremony() external view returns (uint64 epoch);
    }
}

pub fn get_validators_calldata() -> Bytes {
    IValidatorConfig::getValidatorsCall {}.abi_encode().into()
}

pub fn get_next_full_dkg_ceremony_calldata() -> Bytes {
    IValidatorConfig::getNextFullDkgCeremonyCall {}
        .abi_encode()
        .into()
}

pub fn decode_validators(data: &[u8]) -> Result<Vec<Validator>> {
    Ok(IValidatorConfig::getValidatorsCall::abi_decode_returns(data, true)?.validators)
}

pub fn decode_next_full_dkg_ceremony(data: &[u8]) -> Result<u64> {
    Ok(IValidatorConfig::getNextFullDkgCeremonyCall::abi_decode_returns(data, true)?.epoch)
}
