//! Character data editing, node values, text content, and normalization.
//!
//! Offsets and counts are measured in Unicode scalar values.

use super::{Document, NodeFlags, NodeId, NodeKind};
use crate::error::DomError;

/// Converts a scalar-value offset to a byte offset within `s`.
fn byte_offset(s: &str, offset: usize) -> Result<usize, DomError> {
    if offset == 0 {
        return Ok(0);
    }
    let mut count = 0;
    for (i, _) in s.char_indices() {
        if count == offset {
            return Ok(i);
        }
        count += 1;
    }
    if count == offset {
        Ok(s.len())
    } else {
        Err(DomError::IndexSize {
            offset,
            length: count,
        })
    }
}

/// Byte range of `count` scalar values starting at `offset`, clamped to the
/// end of `s`.
fn byte_range(s: &str, offset: usize, count: usize) -> Result<(usize, usize), DomError> {
    let start = byte_offset(s, offset)?;
    let end = s[start..]
        .char_indices()
        .nth(count)
        .map_or(s.len(), |(i, _)| start + i);
    Ok((start, end))
}

impl Document {
    fn char_content(&self, id: NodeId) -> Option<&String> {
        match &self.node(id).kind {
            NodeKind::Text { content }
            | NodeKind::CData { content }
            | NodeKind::Comment { content } => Some(content),
            NodeKind::ProcessingInstruction { data, .. } => Some(data),
            _ => None,
        }
    }

    fn char_content_mut(&mut self, id: NodeId) -> Result<&mut String, DomError> {
        self.check_writable(id)?;
        let parent = self.node(id).parent;
        self.clear_normalized(parent);
        match &mut self.node_mut(id).kind {
            NodeKind::Text { content }
            | NodeKind::CData { content }
            | NodeKind::Comment { content } => Ok(content),
            NodeKind::ProcessingInstruction { data, .. } => Ok(data),
            _ => Err(DomError::NotSupported("node has no character data")),
        }
    }

    /// Returns the character data of a Text, CDATA, Comment, or PI node.
    #[must_use]
    pub fn data(&self, id: NodeId) -> Option<&str> {
        self.char_content(id).map(String::as_str)
    }

    /// Replaces the character data of a node.
    ///
    /// # Errors
    ///
    /// `NoModificationAllowed` on a read-only node, `NotSupported` for
    /// nodes without character data.
    pub fn set_data(&mut self, id: NodeId, data: &str) -> Result<(), DomError> {
        data.clone_into(self.char_content_mut(id)?);
        Ok(())
    }

    /// Returns the length of the character data in scalar values.
    #[must_use]
    pub fn length(&self, id: NodeId) -> usize {
        self.char_content(id).map_or(0, |s| s.chars().count())
    }

    /// Extracts `count` scalar values starting at `offset`. A count past
    /// the end is clamped.
    ///
    /// # Errors
    ///
    /// `IndexSize` when `offset` exceeds the length.
    pub fn substring_data(&self, id: NodeId, offset: usize, count: usize) -> Result<String, DomError> {
        let content = self
            .char_content(id)
            .ok_or(DomError::NotSupported("node has no character data"))?;
        let (start, end) = byte_range(content, offset, count)?;
        Ok(content[start..end].to_string())
    }

    /// Appends to the character data.
    ///
    /// # Errors
    ///
    /// As [`Document::set_data`].
    pub fn append_data(&mut self, id: NodeId, data: &str) -> Result<(), DomError> {
        self.char_content_mut(id)?.push_str(data);
        Ok(())
    }

    /// Inserts `data` at a scalar-value offset.
    ///
    /// # Errors
    ///
    /// `IndexSize` when `offset` exceeds the length, plus the errors of
    /// [`Document::set_data`].
    pub fn insert_data(&mut self, id: NodeId, offset: usize, data: &str) -> Result<(), DomError> {
        let content = self.char_content_mut(id)?;
        let at = byte_offset(content, offset)?;
        content.insert_str(at, data);
        Ok(())
    }

    /// Deletes `count` scalar values starting at `offset`.
    ///
    /// # Errors
    ///
    /// As [`Document::insert_data`].
    pub fn delete_data(&mut self, id: NodeId, offset: usize, count: usize) -> Result<(), DomError> {
        self.replace_data(id, offset, count, "")
    }

    /// Replaces `count` scalar values starting at `offset` with `data`.
    ///
    /// # Errors
    ///
    /// As [`Document::insert_data`].
    pub fn replace_data(
        &mut self,
        id: NodeId,
        offset: usize,
        count: usize,
        data: &str,
    ) -> Result<(), DomError> {
        let content = self.char_content_mut(id)?;
        let (start, end) = byte_range(content, offset, count)?;
        content.replace_range(start..end, data);
        Ok(())
    }

    /// Splits a Text or CDATA node at `offset`. The tail becomes a new
    /// node of the same kind, inserted after the original when it has a
    /// parent. Returns the new node.
    ///
    /// # Errors
    ///
    /// `IndexSize` for a bad offset, `NotSupported` for other node kinds,
    /// `NoModificationAllowed` on a read-only node.
    pub fn split_text(&mut self, id: NodeId, offset: usize) -> Result<NodeId, DomError> {
        self.check_writable(id)?;
        if !matches!(
            self.node(id).kind,
            NodeKind::Text { .. } | NodeKind::CData { .. }
        ) {
            return Err(DomError::NotSupported("only text nodes can be split"));
        }
        if let Some(parent) = self.parent(id) {
            self.check_writable(parent)?;
            self.build(parent)?;
        }
        let content = self.char_content_mut(id)?;
        let at = byte_offset(content, offset)?;
        let tail = content.split_off(at);
        let kind = match self.node(id).kind {
            NodeKind::CData { .. } => NodeKind::CData { content: tail },
            _ => NodeKind::Text { content: tail },
        };
        let new_node = self.create_node(kind);
        if let Some(parent) = self.parent(id) {
            match self.next_sibling_if_available(id) {
                Some(next) => self.link_before(next, new_node),
                None => self.link_append(parent, new_node),
            }
        }
        Ok(new_node)
    }

    /// Returns `true` if a character-data node holds only XML whitespace.
    #[must_use]
    pub fn is_whitespace(&self, id: NodeId) -> bool {
        self.char_content(id)
            .is_some_and(|s| s.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r')))
    }

    /// Returns the target of a processing instruction.
    #[must_use]
    pub fn target(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::ProcessingInstruction { target, .. } => Some(target),
            _ => None,
        }
    }

    // -- Node values --

    /// Returns the DOM node value: the value of an attribute, the data of
    /// a character-data node, `None` otherwise.
    #[must_use]
    pub fn node_value(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Attribute { value, .. } => Some(value),
            _ => self.data(id),
        }
    }

    /// Sets the DOM node value. Has no effect on nodes whose value is
    /// always `None`.
    ///
    /// # Errors
    ///
    /// `NoModificationAllowed` on a read-only node.
    pub fn set_node_value(&mut self, id: NodeId, value: &str) -> Result<(), DomError> {
        self.check_writable(id)?;
        match self.node(id).kind {
            NodeKind::Attribute { .. } => self.set_value(id, value),
            NodeKind::Text { .. }
            | NodeKind::CData { .. }
            | NodeKind::Comment { .. }
            | NodeKind::ProcessingInstruction { .. } => self.set_data(id, value),
            _ => Ok(()),
        }
    }

    /// Returns the DOM text content: descendant Text and CDATA data for
    /// containers, the node value otherwise, `None` for documents and
    /// document types.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn text_content(&mut self, id: NodeId) -> Result<Option<String>, DomError> {
        match self.node(id).kind {
            NodeKind::Document | NodeKind::DocumentType { .. } => Ok(None),
            NodeKind::Element { .. } | NodeKind::DocumentFragment => {
                self.build(id)?;
                let mut text = String::new();
                for d in self.descendants_if_available(id) {
                    if let NodeKind::Text { content } | NodeKind::CData { content } =
                        &self.node(d).kind
                    {
                        text.push_str(content);
                    }
                }
                Ok(Some(text))
            }
            _ => Ok(self.node_value(id).map(str::to_string)),
        }
    }

    /// Sets the DOM text content. A container loses all its children and
    /// gains a single Text child unless `text` is empty.
    ///
    /// # Errors
    ///
    /// `NoModificationAllowed` on a read-only node, cursor failures.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        self.check_writable(id)?;
        match self.node(id).kind {
            NodeKind::Document | NodeKind::DocumentType { .. } => Ok(()),
            NodeKind::Element { .. } | NodeKind::DocumentFragment => {
                self.build(id)?;
                let children: Vec<NodeId> = self.children_if_available(id).collect();
                for child in children {
                    self.unlink(child);
                }
                if !text.is_empty() {
                    let node = self.create_text_node(text);
                    self.link_append(id, node);
                }
                Ok(())
            }
            _ => self.set_node_value(id, text),
        }
    }

    /// Merges adjacent Text nodes and drops empty ones throughout the
    /// subtree, then flags the visited containers as normalized.
    ///
    /// # Errors
    ///
    /// Propagates cursor failures.
    pub fn normalize(&mut self, id: NodeId) -> Result<(), DomError> {
        self.build(id)?;
        let mut stack = vec![id];
        let mut visited = Vec::new();
        while let Some(container) = stack.pop() {
            if self.has_flag(container, NodeFlags::NORMALIZED) {
                continue;
            }
            let mut cursor = self.first_child_if_available(container);
            let mut previous_text: Option<NodeId> = None;
            while let Some(child) = cursor {
                cursor = self.next_sibling_if_available(child);
                let content = match &self.node(child).kind {
                    NodeKind::Text { content } => Some(content.clone()),
                    _ => None,
                };
                match content {
                    Some(c) if c.is_empty() => self.unlink(child),
                    Some(c) => match previous_text {
                        Some(prev) => {
                            self.append_data(prev, &c)?;
                            self.unlink(child);
                        }
                        None => previous_text = Some(child),
                    },
                    None => {
                        previous_text = None;
                        if self.node(child).kind.is_container() {
                            stack.push(child);
                        }
                    }
                }
            }
            visited.push(container);
        }
        for container in visited {
            self.node_mut(container).flags.insert(NodeFlags::NORMALIZED);
        }
        Ok(())
    }
}
