//! Fixture targets for integration tests

use sdb_rs::backend::{Program, SnapshotBuilder};
use std::sync::Arc;

pub const FOO_LIST: u64 = 0x1000;
pub const FOO_TREE: u64 = 0x1100;
pub const TASK_LIST: u64 = 0x1200;
pub const TASK_HASH: u64 = 0x1300;
pub const BROKEN_LIST: u64 = 0x1400;

/// `struct foo` instances, ids 1..=3
pub const FOOS: [u64; 3] = [0x2000, 0x2100, 0x2200];
/// `struct task` instances, pids 10 and 20
pub const TASKS: [u64; 2] = [0x3000, 0x3100];

pub const FOO_LINK_OFFSET: u64 = 8;
pub const FOO_AVL_OFFSET: u64 = 24;
pub const TASK_LIST_OFFSET: u64 = 8;
pub const TASK_HASH_OFFSET: u64 = 24;

/// Declare the list, tree and kernel-list types every fixture uses
pub fn declare_types(builder: &mut SnapshotBuilder) {
    builder
        .define_struct(
            "list_node",
            16,
            &[("next", "struct list_node *", 0), ("prev", "struct list_node *", 8)],
        )
        .unwrap();
    builder.typedef("list_node_t", "struct list_node").unwrap();
    builder
        .define_struct(
            "list",
            32,
            &[
                ("list_size", "unsigned long", 0),
                ("list_offset", "unsigned long", 8),
                ("list_head", "list_node_t", 16),
            ],
        )
        .unwrap();
    builder.typedef("list_t", "struct list").unwrap();

    builder
        .define_struct(
            "avl_node",
            24,
            &[("avl_child", "struct avl_node *[2]", 0), ("avl_pcb", "unsigned long", 16)],
        )
        .unwrap();
    builder.typedef("avl_node_t", "struct avl_node").unwrap();
    builder
        .define_struct(
            "avl_tree",
            24,
            &[
                ("avl_root", "struct avl_node *", 0),
                ("avl_offset", "unsigned long", 8),
                ("avl_numnodes", "unsigned long", 16),
            ],
        )
        .unwrap();
    builder.typedef("avl_tree_t", "struct avl_tree").unwrap();

    builder
        .define_struct(
            "list_head",
            16,
            &[("next", "struct list_head *", 0), ("prev", "struct list_head *", 8)],
        )
        .unwrap();
    builder.declare_struct("hlist_node");
    builder
        .define_struct(
            "hlist_node",
            16,
            &[("next", "struct hlist_node *", 0), ("pprev", "struct hlist_node **", 8)],
        )
        .unwrap();
    builder
        .define_struct("hlist_head", 8, &[("first", "struct hlist_node *", 0)])
        .unwrap();

    builder
        .define_struct(
            "foo",
            48,
            &[
                ("id", "int", 0),
                ("foo_link", "list_node_t", FOO_LINK_OFFSET),
                ("foo_avl", "avl_node_t", FOO_AVL_OFFSET),
            ],
        )
        .unwrap();
    builder
        .define_struct(
            "task",
            40,
            &[
                ("pid", "int", 0),
                ("tasks", "struct list_head", TASK_LIST_OFFSET),
                ("hash", "struct hlist_node", TASK_HASH_OFFSET),
            ],
        )
        .unwrap();
}

/// A target holding a `list_t`, an `avl_tree_t` and Linux lists
pub fn fixture_program() -> Arc<Program> {
    let mut builder = SnapshotBuilder::new();
    declare_types(&mut builder);

    for (i, &foo) in FOOS.iter().enumerate() {
        builder.write_u32(foo, i as u32 + 1);
    }

    // foo_list: circular through the embedded list_node_t
    builder.symbol("foo_list", "list_t", FOO_LIST).unwrap();
    let head = FOO_LIST + 16;
    builder
        .write_u64(FOO_LIST, 48)
        .write_u64(FOO_LIST + 8, FOO_LINK_OFFSET);
    let links: Vec<u64> = FOOS.iter().map(|f| f + FOO_LINK_OFFSET).collect();
    let ring: Vec<u64> = std::iter::once(head).chain(links.iter().copied()).collect();
    for (i, &node) in ring.iter().enumerate() {
        let next = ring[(i + 1) % ring.len()];
        let prev = ring[(i + ring.len() - 1) % ring.len()];
        builder.write_u64(node, next).write_u64(node + 8, prev);
    }

    // foo_tree: foo 2 at the root, foo 1 left, foo 3 right
    builder.symbol("foo_tree", "avl_tree_t", FOO_TREE).unwrap();
    let avl: Vec<u64> = FOOS.iter().map(|f| f + FOO_AVL_OFFSET).collect();
    builder
        .write_u64(FOO_TREE, avl[1])
        .write_u64(FOO_TREE + 8, FOO_AVL_OFFSET)
        .write_u64(FOO_TREE + 16, 3);
    builder
        .write_u64(avl[1], avl[0])
        .write_u64(avl[1] + 8, avl[2])
        .write_u64(avl[0], 0)
        .write_u64(avl[0] + 8, 0)
        .write_u64(avl[2], 0)
        .write_u64(avl[2] + 8, 0);

    // task_list: struct list_head ring through task.tasks
    builder.symbol("task_list", "struct list_head", TASK_LIST).unwrap();
    builder
        .write_u32(TASKS[0], 10)
        .write_u32(TASKS[1], 20)
        .write_u64(TASK_LIST, TASKS[0] + TASK_LIST_OFFSET)
        .write_u64(TASK_LIST + 8, TASKS[1] + TASK_LIST_OFFSET)
        .write_u64(TASKS[0] + TASK_LIST_OFFSET, TASKS[1] + TASK_LIST_OFFSET)
        .write_u64(TASKS[1] + TASK_LIST_OFFSET, TASK_LIST);

    // task_hash: NULL-terminated chain through task.hash
    builder.symbol("task_hash", "struct hlist_head", TASK_HASH).unwrap();
    builder
        .write_u64(TASK_HASH, TASKS[0] + TASK_HASH_OFFSET)
        .write_u64(TASKS[0] + TASK_HASH_OFFSET, TASKS[1] + TASK_HASH_OFFSET)
        .write_u64(TASKS[1] + TASK_HASH_OFFSET, 0);

    // broken_list: the second link is NULL
    builder.symbol("broken_list", "list_t", BROKEN_LIST).unwrap();
    builder
        .write_u64(BROKEN_LIST + 8, FOO_LINK_OFFSET)
        .write_u64(BROKEN_LIST + 16, 0x2408)
        .write_u64(0x2408, 0);

    builder.build()
}

/// Render addresses the way `void *` objects print
pub fn void_pointers(addresses: &[u64]) -> Vec<String> {
    addresses
        .iter()
        .map(|a| format!("(void *){:#x}", a))
        .collect()
}
