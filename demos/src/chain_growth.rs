//! Scenario 6: a `RingBufferChain` started at capacity 2 grows
//! geometrically as 1..40 are enqueued, then drains back out in order.

use anyhow::Result;
use ringactor::RingBufferChain;

fn main() -> Result<()> {
    let chain = RingBufferChain::<u32>::with_initial_capacity(2);
    for i in 1..=40u32 {
        chain.push(i);
    }

    let capacities = chain.node_capacities();
    println!("node capacities: {capacities:?}");
    assert!(capacities.len() >= 5, "expected at least 5 nodes");
    assert_eq!(&capacities[..5], &[2, 4, 8, 16, 32]);

    let mut out = Vec::new();
    while let Some(value) = chain.pop() {
        out.push(value);
    }
    assert_eq!(out, (1..=40u32).collect::<Vec<_>>());

    println!("drained {} items in order", out.len());
    Ok(())
}
