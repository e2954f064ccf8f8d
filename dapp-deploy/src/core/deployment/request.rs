// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Deployment transaction for a compiled contract

use alloy::{
    dyn_abi::{DynSolType, DynSolValue, JsonAbiExt, Specifier},
    json_abi::JsonAbi,
    network::TransactionBuilder,
    primitives::{Address, TxHash},
    rpc::types::TransactionRequest,
};

use serde_json::Value;

use crate::{
    core::{
        arguments::ResolvedArg,
        chain::{ChainConnector, ChainError, ChainReceipt},
    },
    utils::strip_0x,
};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("invalid bytecode for {class_name}, are all libraries linked? ({source})")]
    Bytecode {
        class_name: String,
        #[source]
        source: hex::FromHexError,
    },
    #[error("attempted to deploy {class_name} without specifying parameters")]
    MissingArguments { class_name: String },
    #[error("{class_name} constructor takes {expected} arguments, got {actual}")]
    ArgumentCount {
        class_name: String,
        expected: usize,
        actual: usize,
    },
    #[error("could not encode constructor arg {param} of {class_name}: {source}")]
    Encoding {
        class_name: String,
        param: String,
        #[source]
        source: alloy::dyn_abi::Error,
    },
    #[error("constructor arg {param} of {class_name} expects {expected}, got {found}")]
    TypeMismatch {
        class_name: String,
        param: String,
        expected: String,
        found: String,
    },
    #[error("could not encode constructor of {class_name}: {source}")]
    Constructor {
        class_name: String,
        #[source]
        source: alloy::dyn_abi::Error,
    },
}

/// Contract creation transaction
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    tx: TransactionRequest,
}

impl DeploymentRequest {
    /// Creation request for `code` followed by the ABI encoded constructor arguments.
    pub fn new(
        class_name: &str,
        sender: Address,
        code: &str,
        abi: &JsonAbi,
        args: &[ResolvedArg],
    ) -> Result<Self, RequestError> {
        let mut deploy_code =
            hex::decode(strip_0x(code)).map_err(|source| RequestError::Bytecode {
                class_name: class_name.to_owned(),
                source,
            })?;
        deploy_code.extend(encode_constructor(class_name, abi, args)?);
        Ok(Self {
            tx: TransactionRequest::default()
                .with_from(sender)
                .with_deploy_code(deploy_code),
        })
    }

    pub fn with_gas(mut self, gas: u64) -> Self {
        self.tx.set_gas_limit(gas);
        self
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.tx.set_gas_price(gas_price);
        self
    }

    pub fn tx(&self) -> &TransactionRequest {
        &self.tx
    }

    pub async fn estimate_gas(&self, chain: &impl ChainConnector) -> Result<u64, ChainError> {
        chain.estimate_gas(&self.tx).await
    }

    pub async fn exec(
        self,
        chain: &impl ChainConnector,
        on_hash: impl FnOnce(TxHash) + Send,
    ) -> Result<ChainReceipt, ChainError> {
        chain.send_transaction(self.tx, on_hash).await
    }
}

fn encode_constructor(
    class_name: &str,
    abi: &JsonAbi,
    args: &[ResolvedArg],
) -> Result<Vec<u8>, RequestError> {
    let Some(constructor) = &abi.constructor else {
        if args.is_empty() {
            return Ok(Vec::new());
        }
        return Err(RequestError::ArgumentCount {
            class_name: class_name.to_owned(),
            expected: 0,
            actual: args.len(),
        });
    };
    if args.len() != constructor.inputs.len() {
        if args.is_empty() {
            return Err(RequestError::MissingArguments {
                class_name: class_name.to_owned(),
            });
        }
        return Err(RequestError::ArgumentCount {
            class_name: class_name.to_owned(),
            expected: constructor.inputs.len(),
            actual: args.len(),
        });
    }

    let mut values = Vec::<DynSolValue>::with_capacity(args.len());
    for (arg, param) in args.iter().zip(constructor.inputs.iter()) {
        let ty = param.resolve().map_err(|source| RequestError::Encoding {
            class_name: class_name.to_owned(),
            param: param.to_string(),
            source,
        })?;
        let value = to_sol_value(arg, &ty).map_err(|err| match err {
            ValueError::Coerce(source) => RequestError::Encoding {
                class_name: class_name.to_owned(),
                param: param.to_string(),
                source,
            },
            ValueError::Mismatch { expected, found } => RequestError::TypeMismatch {
                class_name: class_name.to_owned(),
                param: param.to_string(),
                expected,
                found,
            },
        })?;
        values.push(value);
    }
    constructor
        .abi_encode_input_raw(&values)
        .map_err(|source| RequestError::Constructor {
            class_name: class_name.to_owned(),
            source,
        })
}

enum ValueError {
    Coerce(alloy::dyn_abi::Error),
    Mismatch { expected: String, found: String },
}

/// Builds the ABI value of `arg` for a parameter of type `ty`.
///
/// Arrays and tuples are built element by element; only scalars go through string coercion,
/// so element text is never re-parsed as list syntax.
fn to_sol_value(arg: &ResolvedArg, ty: &DynSolType) -> Result<DynSolValue, ValueError> {
    let mismatch = || ValueError::Mismatch {
        expected: ty.sol_type_name().into_owned(),
        found: match arg {
            ResolvedArg::Value(value) => value.to_string(),
            ResolvedArg::Address(address) => address.to_string(),
            ResolvedArg::Sequence(args) => format!("a list of {}", args.len()),
        },
    };
    let items: Vec<ResolvedArg> = match arg {
        ResolvedArg::Address(address) => {
            return match ty {
                DynSolType::Address => Ok(DynSolValue::Address(*address)),
                _ => ty.coerce_str(&address.to_string()).map_err(ValueError::Coerce),
            };
        }
        ResolvedArg::Value(Value::String(text)) => {
            return match ty {
                DynSolType::String => Ok(DynSolValue::String(text.clone())),
                _ => ty.coerce_str(text).map_err(ValueError::Coerce),
            };
        }
        ResolvedArg::Value(Value::Array(values)) => {
            values.iter().cloned().map(ResolvedArg::Value).collect()
        }
        ResolvedArg::Value(Value::Null) => {
            return ty.coerce_str("").map_err(ValueError::Coerce);
        }
        ResolvedArg::Value(value) => {
            return ty
                .coerce_str(&value.to_string())
                .map_err(ValueError::Coerce);
        }
        ResolvedArg::Sequence(args) => args.clone(),
    };

    match ty {
        DynSolType::Array(inner) => items
            .iter()
            .map(|item| to_sol_value(item, inner))
            .collect::<Result<_, _>>()
            .map(DynSolValue::Array),
        DynSolType::FixedArray(inner, len) if items.len() == *len => items
            .iter()
            .map(|item| to_sol_value(item, inner))
            .collect::<Result<_, _>>()
            .map(DynSolValue::FixedArray),
        DynSolType::Tuple(types) if items.len() == types.len() => items
            .iter()
            .zip(types)
            .map(|(item, ty)| to_sol_value(item, ty))
            .collect::<Result<_, _>>()
            .map(DynSolValue::Tuple),
        _ => Err(mismatch()),
    }
}
