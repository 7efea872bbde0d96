// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Property tests: random mutation sequences either commit exactly the working
//! snapshot or roll back to exactly the starting graph, and replaying the
//! registered undo log on the working snapshot reproduces the starting graph.

mod common;

use common::{flaky_graph, seed_graph};
use futures::FutureExt;
use kgraph_core::{
    Edge, EdgeUpdate, Graph, KnowledgeGraph, KnowledgeGraphError, MetadataAddition,
    MetadataDeletion, Node, NodeUpdate, RollbackCommand, ValidationError,
};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    AddNode(String),
    UpdateNode(String, String),
    ReplaceMetadata(String, Vec<String>),
    DeleteNode(String),
    AddEdge(String, String, String),
    UpdateEdge(String, String, String, String),
    DeleteEdge(String, String, String),
    AddMetadata(String, String),
    DeleteMetadata(String, String),
}

fn name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["A", "B", "C", "D", "E"]).prop_map(String::from)
}

fn relation() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["knows", "works_at"]).prop_map(String::from)
}

fn note() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["likes tea", "likes coffee", "runs", "reads"]).prop_map(String::from)
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        name().prop_map(Op::AddNode),
        (name(), prop::sample::select(vec!["person", "robot"]))
            .prop_map(|(n, t)| Op::UpdateNode(n, t.to_string())),
        (name(), prop::collection::vec(note(), 0..3)).prop_map(|(n, m)| Op::ReplaceMetadata(n, m)),
        name().prop_map(Op::DeleteNode),
        (name(), name(), relation()).prop_map(|(f, t, r)| Op::AddEdge(f, t, r)),
        (name(), name(), relation(), name()).prop_map(|(f, t, r, nt)| Op::UpdateEdge(f, t, r, nt)),
        (name(), name(), relation()).prop_map(|(f, t, r)| Op::DeleteEdge(f, t, r)),
        (name(), note()).prop_map(|(n, m)| Op::AddMetadata(n, m)),
        (name(), note()).prop_map(|(n, m)| Op::DeleteMetadata(n, m)),
    ]
}

/// Apply `op`, ignoring validation failures: a rejected batch changes nothing.
async fn apply(kg: &KnowledgeGraph, op: Op) -> Result<(), KnowledgeGraphError> {
    let outcome = match op {
        Op::AddNode(n) => kg.add_nodes(vec![Node::new(n, "person")]).await.map(drop),
        Op::UpdateNode(n, t) => kg
            .update_nodes(vec![NodeUpdate {
                name: n,
                node_type: Some(t),
                metadata: None,
            }])
            .await
            .map(drop),
        Op::ReplaceMetadata(n, m) => kg
            .update_nodes(vec![NodeUpdate {
                name: n,
                node_type: None,
                metadata: Some(m),
            }])
            .await
            .map(drop),
        Op::DeleteNode(n) => kg.delete_nodes(vec![n]).await,
        Op::AddEdge(f, t, r) => kg.add_edges(vec![Edge::new(f, t, r)]).await.map(drop),
        Op::UpdateEdge(f, t, r, nt) => kg
            .update_edges(vec![EdgeUpdate {
                from: f,
                to: t,
                relation_type: r,
                new_to: Some(nt),
                ..Default::default()
            }])
            .await
            .map(drop),
        Op::DeleteEdge(f, t, r) => kg.delete_edges(vec![Edge::new(f, t, r)]).await,
        Op::AddMetadata(n, m) => kg
            .add_metadata(vec![MetadataAddition {
                node_name: n,
                contents: vec![m],
            }])
            .await
            .map(drop),
        Op::DeleteMetadata(n, m) => kg
            .delete_metadata(vec![MetadataDeletion {
                node_name: n,
                contents: vec![m],
            }])
            .await
    };
    match outcome {
        Err(KnowledgeGraphError::Validation(_)) => Ok(()),
        other => other,
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_failed_transaction_restores_durable_graph(ops in prop::collection::vec(op(), 0..24)) {
        let (kg, backend) = flaky_graph();
        let rt = runtime();

        let result: Result<(), KnowledgeGraphError> = rt.block_on(kg.with_transaction(|kg| {
            async move {
                for op in ops {
                    apply(kg, op).await?;
                }
                Err::<(), KnowledgeGraphError>(ValidationError::Malformed("abort".into()).into())
            }
            .boxed()
        }));

        prop_assert!(matches!(result, Err(KnowledgeGraphError::Validation(_))));
        prop_assert!(!rt.block_on(kg.is_in_transaction()));
        prop_assert_eq!(rt.block_on(backend.durable()), seed_graph());
    }

    #[test]
    fn prop_undo_log_restores_starting_graph(ops in prop::collection::vec(op(), 0..30)) {
        let (kg, _backend) = flaky_graph();
        let rt = runtime();

        let (replayed, rolled_back) = rt.block_on(async {
            kg.begin_transaction().await.unwrap();
            for op in ops {
                apply(&kg, op).await.unwrap();
            }

            let info = kg.transaction_info().await.unwrap();
            let mut replayed = kg.get_current_graph().await.unwrap();
            for action in info.rollback_actions.iter().rev() {
                action.command.apply(&mut replayed).unwrap();
            }

            kg.rollback().await.unwrap();
            (replayed, kg.read_graph().await.unwrap())
        });

        prop_assert_eq!(replayed, seed_graph());
        prop_assert_eq!(rolled_back, seed_graph());
    }

    #[test]
    fn prop_committed_transaction_persists_working_snapshot(ops in prop::collection::vec(op(), 0..24)) {
        let (kg, backend) = flaky_graph();
        let rt = runtime();

        let snapshot: Graph = rt.block_on(kg.with_transaction(|kg| {
            async move {
                for op in ops {
                    apply(kg, op).await?;
                }
                kg.get_current_graph().await
            }
            .boxed()
        })).unwrap();

        prop_assert_eq!(rt.block_on(backend.durable()), snapshot);
    }

    #[test]
    fn prop_undo_steps_run_in_reverse_order(count in 1usize..12) {
        let (kg, _backend) = flaky_graph();
        let rt = runtime();

        let failures = rt.block_on(async {
            kg.begin_transaction().await.unwrap();
            for i in 0..count {
                kg.add_rollback_action(
                    RollbackCommand::RemoveNodes { names: vec![format!("ghost-{i}")] },
                    format!("step {i}"),
                )
                .await
                .unwrap();
            }
            match kg.rollback().await {
                Err(KnowledgeGraphError::RollbackAggregate { failures, .. }) => failures,
                other => panic!("expected rollback aggregate, got {other:?}"),
            }
        });

        let order: Vec<String> = failures.into_iter().map(|f| f.description).collect();
        let expected: Vec<String> = (0..count).rev().map(|i| format!("step {i}")).collect();
        prop_assert_eq!(order, expected);
    }
}
