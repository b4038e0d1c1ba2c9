//! Slot decorators
//!
//! Each decorator looks for the structure its slot is expected to hold
//! and restructures it into controls. Missing structure means there is
//! nothing to decorate: the decorator returns without touching the slot.

use navkit_dom::{DomResult, DomTree, NodeId};

use crate::disclosure::DisclosureWidget;

/// `<i class="symbol symbol-{name}">`
pub fn build_symbol(tree: &mut DomTree, name: &str) -> NodeId {
    let icon = tree.create_element("i");
    tree.set_attribute(icon, "class", format!("symbol symbol-{name}"));
    icon
}

/// `<button type="button" id="{id}">`
pub fn build_button(tree: &mut DomTree, id: &str) -> NodeId {
    let button = tree.create_element("button");
    tree.set_attribute(button, "type", "button");
    tree.set_attribute(button, "id", id);
    button
}

/// Rebuild `el` as its icon (if any) followed by `<span class="text">`
/// holding its trimmed text.
pub fn wrap_anchor_text(tree: &mut DomTree, el: NodeId) -> DomResult<()> {
    let icon = tree.query_selector(el, "span.icon");
    let text = tree.text_content(el).trim().to_string();

    tree.remove_children(el);
    if let Some(icon) = icon {
        tree.append_child(el, icon)?;
    }
    let span = tree.create_element("span");
    tree.set_attribute(span, "class", "text");
    tree.set_text_content(span, &text)?;
    tree.append_child(el, span)?;
    Ok(())
}

fn append_chevron(tree: &mut DomTree, el: NodeId) -> DomResult<()> {
    let chevron = build_symbol(tree, "chevron");
    tree.append_child(el, chevron)?;
    Ok(())
}

/// Make the brand clickable when it was authored as plain text.
///
/// Returns false when the brand already links somewhere or has no
/// heading or paragraph to wrap.
pub fn decorate_brand(tree: &mut DomTree, slot: NodeId, fallback_title: &str) -> DomResult<bool> {
    if tree.query_selector(slot, "a[href]").is_some() {
        return Ok(false);
    }
    let Some(content) = tree.query_selector(slot, "h1, h2, h3, h4, h5, h6, p") else {
        tracing::debug!("brand has neither a link nor a label");
        return Ok(false);
    };

    tree.set_attribute(content, "class", "brand-content");
    let link = tree.create_element("a");
    if tree.text_content(content).is_empty() {
        tree.set_attribute(link, "title", fallback_title);
    }
    tree.set_attribute(link, "href", "/");
    tree.move_children(content, link)?;
    tree.append_child(content, link)?;
    Ok(true)
}

/// Style the first tools link as a button and turn the search icon into
/// `button#search`. Returns the search button.
pub fn decorate_tools(tree: &mut DomTree, slot: NodeId) -> DomResult<Option<NodeId>> {
    if let Some(a) = tree.query_selector(slot, "a") {
        wrap_anchor_text(tree, a)?;
        append_chevron(tree, a)?;
        tree.set_attribute(a, "class", "button");
        let label = tree.text_content(a).trim().to_string();
        tree.set_attribute(a, "aria-label", label);
        if let Some(parent) = tree.parent(a) {
            tree.set_attribute(parent, "class", "button-wrapper");
        }
    }

    let Some(icon) = tree.query_selector(slot, "span.icon.icon-search") else {
        tracing::debug!("tools slot has no search icon");
        return Ok(None);
    };
    let Some(wrapper) = tree.parent(icon) else {
        return Ok(None);
    };
    let button = build_button(tree, "search");
    tree.set_attribute(button, "aria-label", "Search");
    tree.remove_children(wrapper);
    tree.append_child(button, icon)?;
    tree.append_child(wrapper, button)?;
    Ok(Some(button))
}

/// Replace the slot's paragraph with `button#location-finder`
pub fn decorate_location_finder(tree: &mut DomTree, slot: NodeId) -> DomResult<Option<NodeId>> {
    let Some(p) = tree.query_selector(slot, "p") else {
        return Ok(None);
    };
    let button = build_button(tree, "location-finder");
    tree.move_children(p, button)?;
    wrap_anchor_text(tree, button)?;
    append_chevron(tree, button)?;
    tree.remove_children(slot);
    tree.append_child(slot, button)?;
    Ok(Some(button))
}

/// Put a `button#language-picker` in front of the language list and mark
/// the list up as a listbox. The button is labelled with the current
/// language (the list's `<strong>` entry).
pub fn decorate_language_picker(
    tree: &mut DomTree,
    slot: NodeId,
) -> DomResult<Option<DisclosureWidget>> {
    let Some(list) = tree.query_selector(slot, "ul, ol") else {
        return Ok(None);
    };
    let Some(parent) = tree.parent(list) else {
        return Ok(None);
    };
    let current = tree
        .query_selector(list, "strong")
        .or_else(|| tree.first_element_child(list))
        .map(|el| tree.text_content(el).trim().to_string())
        .unwrap_or_default();

    let button = build_button(tree, "language-picker");
    tree.set_text_content(button, &current)?;
    append_chevron(tree, button)?;
    tree.insert_before(parent, button, Some(list))?;

    tree.set_attribute(list, "role", "listbox");
    tree.set_attribute(list, "aria-labelledby", "language-picker");
    for li in tree.element_children(list) {
        tree.set_attribute(li, "role", "option");
    }

    let widget = DisclosureWidget::new("language-picker", button, list);
    widget.sync(tree);
    Ok(Some(widget))
}

/// Reduce the alert slot to its link
pub fn decorate_alert(tree: &mut DomTree, slot: NodeId) -> DomResult<Option<NodeId>> {
    let Some(a) = tree.query_selector(slot, "a") else {
        return Ok(None);
    };
    tree.remove_attribute(a, "class");
    wrap_anchor_text(tree, a)?;
    tree.remove_children(slot);
    tree.append_child(slot, a)?;
    Ok(Some(a))
}
