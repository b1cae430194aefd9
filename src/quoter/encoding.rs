// Quoter call encoding
// Packs routes into V3 paths and encodes/decodes quoter calls for both
// trade directions
//
// Numan Thabit 2025 Nov

use crate::router::routes::{Route, TradeType};
use alloy_primitives::{Bytes, U160, U256};
use alloy_sol_types::{sol, sol_data, SolCall, SolType};

sol! {
    interface IQuoterV2 {
        function quoteExactInput(bytes memory path, uint256 amountIn)
            external
            returns (
                uint256 amountOut,
                uint160[] memory sqrtPriceX96AfterList,
                uint32[] memory initializedTicksCrossedList,
                uint256 gasEstimate
            );

        function quoteExactOutput(bytes memory path, uint256 amountOut)
            external
            returns (
                uint256 amountIn,
                uint160[] memory sqrtPriceX96AfterList,
                uint32[] memory initializedTicksCrossedList,
                uint256 gasEstimate
            );
    }
}

/// Quoter result for one (route, amount) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedQuote {
    pub amount: U256,
    pub sqrt_price_x96_after_list: Vec<U160>,
    pub initialized_ticks_crossed_list: Vec<u32>,
    pub gas_estimate: U256,
}

impl DecodedQuote {
    pub fn ticks_crossed(&self) -> u32 {
        self.initialized_ticks_crossed_list.iter().copied().sum()
    }
}

pub fn function_name(trade_type: TradeType) -> &'static str {
    match trade_type {
        TradeType::ExactInput => "quoteExactInput",
        TradeType::ExactOutput => "quoteExactOutput",
    }
}

/// `token (20) | fee (3) | token (20) | ...`, reversed for exact-output quotes.
pub fn encode_route_to_path(route: &Route, exact_output: bool) -> Bytes {
    match route {
        Route::V3(v3) => {
            let tokens = v3.token_path();
            let mut out = Vec::with_capacity(tokens.len() * 20 + v3.pools().len() * 3);
            let hops: Vec<(u32, _)> = v3
                .pools()
                .iter()
                .map(|p| p.fee)
                .zip(tokens.iter().skip(1))
                .collect();
            if exact_output {
                out.extend_from_slice(v3.output().as_slice());
                for (i, (fee, _)) in hops.iter().enumerate().rev() {
                    out.extend_from_slice(&fee.to_be_bytes()[1..]);
                    out.extend_from_slice(tokens[i].as_slice());
                }
            } else {
                out.extend_from_slice(v3.input().as_slice());
                for (fee, token) in &hops {
                    out.extend_from_slice(&fee.to_be_bytes()[1..]);
                    out.extend_from_slice(token.as_slice());
                }
            }
            Bytes::from(out)
        }
    }
}

pub fn encode_quote_call(route: &Route, amount: U256, trade_type: TradeType) -> Bytes {
    match trade_type {
        TradeType::ExactInput => IQuoterV2::quoteExactInputCall {
            path: encode_route_to_path(route, false),
            amountIn: amount,
        }
        .abi_encode()
        .into(),
        TradeType::ExactOutput => IQuoterV2::quoteExactOutputCall {
            path: encode_route_to_path(route, true),
            amountOut: amount,
        }
        .abi_encode()
        .into(),
    }
}

/// `None` when the return data does not decode; the caller treats that as a
/// failed call.
pub fn decode_quote_result(trade_type: TradeType, data: &[u8]) -> Option<DecodedQuote> {
    match trade_type {
        TradeType::ExactInput => {
            let ret = IQuoterV2::quoteExactInputCall::abi_decode_returns(data).ok()?;
            Some(DecodedQuote {
                amount: ret.amountOut,
                sqrt_price_x96_after_list: ret.sqrtPriceX96AfterList,
                initialized_ticks_crossed_list: ret.initializedTicksCrossedList,
                gas_estimate: ret.gasEstimate,
            })
        }
        TradeType::ExactOutput => {
            let ret = IQuoterV2::quoteExactOutputCall::abi_decode_returns(data).ok()?;
            Some(DecodedQuote {
                amount: ret.amountIn,
                sqrt_price_x96_after_list: ret.sqrtPriceX96AfterList,
                initialized_ticks_crossed_list: ret.initializedTicksCrossedList,
                gas_estimate: ret.gasEstimate,
            })
        }
    }
}

/// Encoded quoter return data, for executors that simulate the quoter.
pub fn encode_quote_result(quote: &DecodedQuote) -> Bytes {
    type QuoteReturn = (
        sol_data::Uint<256>,
        sol_data::Array<sol_data::Uint<160>>,
        sol_data::Array<sol_data::Uint<32>>,
        sol_data::Uint<256>,
    );
    <QuoteReturn as SolType>::abi_encode_params(&(
        quote.amount,
        quote.sqrt_price_x96_after_list.clone(),
        quote.initialized_ticks_crossed_list.clone(),
        quote.gas_estimate,
    ))
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::routes::test_utils::{pool, token};
    use crate::router::routes::V3Route;

    fn route() -> Route {
        V3Route::new(vec![pool(1, 1, 2), pool(2, 2, 3)], token(1), token(3))
            .unwrap()
            .into()
    }

    #[test]
    fn exact_input_path_runs_input_to_output() {
        let path = encode_route_to_path(&route(), false);
        assert_eq!(path.len(), 66);
        assert_eq!(&path[..20], token(1).as_slice());
        assert_eq!(&path[20..23], &[0x00, 0x0b, 0xb8]);
        assert_eq!(&path[23..43], token(2).as_slice());
        assert_eq!(&path[46..], token(3).as_slice());
    }

    #[test]
    fn exact_output_path_is_reversed() {
        let path = encode_route_to_path(&route(), true);
        assert_eq!(&path[..20], token(3).as_slice());
        assert_eq!(&path[23..43], token(2).as_slice());
        assert_eq!(&path[46..], token(1).as_slice());
    }

    #[test]
    fn quote_call_uses_direction_selector() {
        let data = encode_quote_call(&route(), U256::from(5u64), TradeType::ExactInput);
        assert_eq!(&data[..4], IQuoterV2::quoteExactInputCall::SELECTOR.as_slice());
        let data = encode_quote_call(&route(), U256::from(5u64), TradeType::ExactOutput);
        assert_eq!(&data[..4], IQuoterV2::quoteExactOutputCall::SELECTOR.as_slice());
    }

    #[test]
    fn quote_result_decodes() {
        let quote = DecodedQuote {
            amount: U256::from(777u64),
            sqrt_price_x96_after_list: vec![U160::from(1u64), U160::from(2u64)],
            initialized_ticks_crossed_list: vec![1, 3],
            gas_estimate: U256::from(150_000u64),
        };
        let data = encode_quote_result(&quote);
        let decoded = decode_quote_result(TradeType::ExactInput, &data).unwrap();
        assert_eq!(decoded, quote);
        assert_eq!(decoded.ticks_crossed(), 4);
        assert!(decode_quote_result(TradeType::ExactInput, &[0u8; 7]).is_none());
    }
}
