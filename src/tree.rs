// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of Parity.

// Parity is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Parity is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Parity.  If not, see <http://www.gnu.org/licenses/>.

//! A self-balancing (AVL) ordered map over a total order on `K`.
//!
//! This is the "ordered map" component of the store: the index table layers
//! a table-level lock and per-key locks on top of it, but the tree itself
//! carries no concurrency of its own. Balance is maintained on every insert
//! so lookups stay logarithmic regardless of key insertion order.

use std::cmp::Ordering;
use std::mem;

struct Node<K, V> {
	key: K,
	value: V,
	height: i32,
	left: Link<K, V>,
	right: Link<K, V>,
}

type Link<K, V> = Option<Box<Node<K, V>>>;

/// Outcome of [`AvlTree::insert`].
pub enum Inserted<V> {
	/// The key was new; the tree gained an entry.
	New,
	/// The key already existed; its old value is returned.
	Replaced(V),
}

pub struct AvlTree<K, V> {
	root: Link<K, V>,
	len: usize,
}

impl<K: Ord, V> Default for AvlTree<K, V> {
	fn default() -> Self {
		AvlTree { root: None, len: 0 }
	}
}

fn height<K, V>(node: &Link<K, V>) -> i32 {
	node.as_ref().map_or(0, |n| n.height)
}

fn balance_factor<K, V>(node: &Node<K, V>) -> i32 {
	height(&node.left) - height(&node.right)
}

fn update_height<K, V>(node: &mut Node<K, V>) {
	node.height = 1 + height(&node.left).max(height(&node.right));
}

fn rotate_right<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
	let mut left = node.left.take().expect("rotate_right requires a left child");
	node.left = left.right.take();
	update_height(&mut node);
	left.right = Some(node);
	update_height(&mut left);
	left
}

fn rotate_left<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
	let mut right = node.right.take().expect("rotate_left requires a right child");
	node.right = right.left.take();
	update_height(&mut node);
	right.left = Some(node);
	update_height(&mut right);
	right
}

fn rebalance<K, V>(mut node: Box<Node<K, V>>) -> Box<Node<K, V>> {
	update_height(&mut node);
	let bf = balance_factor(&node);
	if bf > 1 {
		if balance_factor(node.left.as_ref().unwrap()) < 0 {
			let left = node.left.take().unwrap();
			node.left = Some(rotate_left(left));
		}
		node = rotate_right(node);
	} else if bf < -1 {
		if balance_factor(node.right.as_ref().unwrap()) > 0 {
			let right = node.right.take().unwrap();
			node.right = Some(rotate_right(right));
		}
		node = rotate_left(node);
	}
	node
}

fn insert<K: Ord, V>(link: Link<K, V>, key: K, value: V, inserted: &mut Option<Inserted<V>>) -> Link<K, V> {
	let mut node = match link {
		None => {
			*inserted = Some(Inserted::New);
			return Some(Box::new(Node { key, value, height: 1, left: None, right: None }));
		}
		Some(node) => node,
	};
	match key.cmp(&node.key) {
		Ordering::Less => node.left = insert(node.left.take(), key, value, inserted),
		Ordering::Greater => node.right = insert(node.right.take(), key, value, inserted),
		Ordering::Equal => {
			let old = mem::replace(&mut node.value, value);
			*inserted = Some(Inserted::Replaced(old));
			return Some(node);
		}
	}
	Some(rebalance(node))
}

fn search<'a, K: Ord, V>(link: &'a Link<K, V>, key: &K) -> Option<&'a V> {
	let mut cur = link.as_deref();
	while let Some(node) = cur {
		cur = match key.cmp(&node.key) {
			Ordering::Less => node.left.as_deref(),
			Ordering::Greater => node.right.as_deref(),
			Ordering::Equal => return Some(&node.value),
		};
	}
	None
}

fn search_mut<'a, K: Ord, V>(link: &'a mut Link<K, V>, key: &K) -> Option<&'a mut V> {
	let mut cur = link.as_deref_mut();
	while let Some(node) = cur {
		match key.cmp(&node.key) {
			Ordering::Less => cur = node.left.as_deref_mut(),
			Ordering::Greater => cur = node.right.as_deref_mut(),
			Ordering::Equal => return Some(&mut node.value),
		}
	}
	None
}

fn in_order<'a, K, V>(link: &'a Link<K, V>, out: &mut Vec<(&'a K, &'a V)>) {
	if let Some(node) = link {
		in_order(&node.left, out);
		out.push((&node.key, &node.value));
		in_order(&node.right, out);
	}
}

impl<K: Ord, V> AvlTree<K, V> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Insert `key => value`, returning whether this created a new entry or
	/// replaced an existing one.
	pub fn insert(&mut self, key: K, value: V) -> Inserted<V> {
		let mut outcome = None;
		self.root = insert(self.root.take(), key, value, &mut outcome);
		let outcome = outcome.expect("insert always records an outcome");
		if matches!(outcome, Inserted::New) {
			self.len += 1;
		}
		outcome
	}

	pub fn search(&self, key: &K) -> Option<&V> {
		search(&self.root, key)
	}

	pub fn search_mut(&mut self, key: &K) -> Option<&mut V> {
		search_mut(&mut self.root, key)
	}

	pub fn contains(&self, key: &K) -> bool {
		self.search(key).is_some()
	}

	/// In-order traversal, used only by the index-build scan.
	pub fn in_order(&self) -> Vec<(&K, &V)> {
		let mut out = Vec::with_capacity(self.len);
		in_order(&self.root, &mut out);
		out
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node_height<K, V>(link: &Link<K, V>) -> i32 {
		height(link)
	}

	fn is_balanced<K, V>(link: &Link<K, V>) -> bool {
		match link {
			None => true,
			Some(node) => {
				balance_factor(node).abs() <= 1 && is_balanced(&node.left) && is_balanced(&node.right)
			}
		}
	}

	#[test]
	fn insert_and_search() {
		let mut t = AvlTree::new();
		for i in 0..100 {
			assert!(matches!(t.insert(i, i * 2), Inserted::New));
		}
		assert_eq!(t.len(), 100);
		for i in 0..100 {
			assert_eq!(t.search(&i), Some(&(i * 2)));
		}
		assert_eq!(t.search(&100), None);
	}

	#[test]
	fn insert_replaces_existing_key() {
		let mut t = AvlTree::new();
		t.insert("a", 1);
		match t.insert("a", 2) {
			Inserted::Replaced(old) => assert_eq!(old, 1),
			Inserted::New => panic!("expected replace"),
		}
		assert_eq!(t.len(), 1);
		assert_eq!(t.search(&"a"), Some(&2));
	}

	#[test]
	fn stays_balanced_under_sorted_insertion() {
		let mut t = AvlTree::new();
		for i in 0..2000 {
			t.insert(i, ());
		}
		assert!(is_balanced(&t.root));
		let h = node_height(&t.root);
		// log2(2000) ~= 11; AVL guarantees height stays within a small constant factor of that.
		assert!(h < 20, "tree height {} too large for 2000 sorted inserts", h);
	}

	#[test]
	fn in_order_is_sorted() {
		let mut t = AvlTree::new();
		for i in [5, 3, 8, 1, 4, 7, 9, 2, 6, 0] {
			t.insert(i, i);
		}
		let seen: Vec<i32> = t.in_order().into_iter().map(|(k, _)| *k).collect();
		assert_eq!(seen, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
	}

	#[test]
	fn search_mut_allows_in_place_update() {
		let mut t = AvlTree::new();
		t.insert(1, 10);
		*t.search_mut(&1).unwrap() += 5;
		assert_eq!(t.search(&1), Some(&15));
	}
}
