use super::*;

enum Tree {
    Leaf(u64),
    Add(Box<Tree>, Box<Tree>),
}

fn left_leaning(depth: u64) -> Tree {
    let mut tree = Tree::Leaf(1);
    for _ in 0..depth {
        tree = Tree::Add(Box::new(tree), Box::new(Tree::Leaf(1)));
    }
    tree
}

fn sum(tree: &Tree) -> u64 {
    ensure_sufficient_stack(|| match tree {
        Tree::Leaf(n) => *n,
        Tree::Add(l, r) => sum(l) + sum(r),
    })
}

fn drop_iteratively(tree: Tree) {
    let mut stack = vec![tree];
    while let Some(node) = stack.pop() {
        if let Tree::Add(l, r) = node {
            stack.push(*l);
            stack.push(*r);
        }
    }
}

#[test]
fn test_shallow_tree() {
    let tree = left_leaning(10);
    assert_eq!(sum(&tree), 11);
}

#[test]
fn test_deep_tree_does_not_overflow() {
    let tree = left_leaning(200_000);
    assert_eq!(sum(&tree), 200_001);
    drop_iteratively(tree);
}

#[test]
fn test_propagates_result() {
    let r: Result<u8, String> = ensure_sufficient_stack(|| Err("boom".to_string()));
    assert_eq!(r, Err("boom".to_string()));
}

#[test]
fn test_remaining_stack_reported() {
    if let Some(left) = remaining_stack() {
        assert!(left > 0);
    }
}
